//! AWS API Gateway proxy binding of the GraphQL schema.
//!
//! `GET` requests carry the GraphQL request in the query string, `POST`
//! requests carry a single request object or a batch array in the body.

use std::sync::Arc;

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::query_map::QueryMap;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::join_all;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use juniper::{http as juniper_http, FieldError, InputValue, Value};
use juniper_http::GraphQLRequest as GqlR;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info_span, warn, Instrument};

use crate::context::{identity_from_authorization, Context, DataSources};
use crate::error::Result;
use crate::types::Schema;

/// Reasons an incoming event is not a GraphQL request.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Invalid method {0}")]
    InvalidMethod(Method),
    #[error("Missing query argument")]
    MissingQuery,
    #[error("Missing post body")]
    MissingPostBody,
    #[error("Invalid body")]
    InvalidBody,
    #[error("Prohibit extra field {0}")]
    ProhibitExtraField(String),
    #[error("Query parameter must not occur more than once")]
    MultipleQueryParameter,
    #[error("Operation name parameter must not occur more than once")]
    MultipleOperationNameParameter,
    #[error("Variables parameter must not occur more than once")]
    MultipleVariablesParameter,
    #[error("Invalid variables parameter")]
    InvalidVariablesParameter,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GraphQLBatchRequest {
    Single(GqlR),
    Batch(Vec<GqlR>),
}

impl GraphQLBatchRequest {
    async fn execute(&self, schema: &Schema, context: &Context) -> GraphQLBatchResponse {
        match self {
            GraphQLBatchRequest::Single(request) => {
                GraphQLBatchResponse::Single(request.execute(schema, context).await)
            }
            GraphQLBatchRequest::Batch(requests) => GraphQLBatchResponse::Batch(
                join_all(
                    requests
                        .iter()
                        .map(|request| request.execute(schema, context)),
                )
                .await,
            ),
        }
    }

    fn operation_names(&self) -> Vec<Option<&str>> {
        match self {
            GraphQLBatchRequest::Single(req) => vec![req.operation_name.as_deref()],
            GraphQLBatchRequest::Batch(reqs) => reqs
                .iter()
                .map(|req| req.operation_name.as_deref())
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum GraphQLBatchResponse {
    Single(juniper_http::GraphQLResponse),
    Batch(Vec<juniper_http::GraphQLResponse>),
}

impl GraphQLBatchResponse {
    fn is_ok(&self) -> bool {
        match self {
            GraphQLBatchResponse::Single(response) => response.is_ok(),
            GraphQLBatchResponse::Batch(responses) => {
                responses.iter().all(|response| response.is_ok())
            }
        }
    }
}

fn response(
    status_code: StatusCode,
    content_type: &'static str,
    body: String,
) -> ApiGatewayProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    ApiGatewayProxyResponse {
        status_code: i64::from(status_code.as_u16()),
        headers,
        is_base64_encoded: false,
        body: Some(Body::Text(body)),
        ..Default::default()
    }
}

fn html(body: String) -> ApiGatewayProxyResponse {
    response(StatusCode::OK, "text/html", body)
}

fn json(status_code: StatusCode, body: String) -> ApiGatewayProxyResponse {
    response(status_code, "application/json", body)
}

/// API Gateway hands over the multi value map for REST apis, the single
/// value map is all there is for some test events.
fn query_parameters(req: &ApiGatewayProxyRequest) -> &QueryMap {
    if req.multi_value_query_string_parameters.iter().next().is_some() {
        &req.multi_value_query_string_parameters
    } else {
        &req.query_string_parameters
    }
}

fn single_parameter(
    params: &QueryMap,
    key: &str,
    repeated: RequestError,
) -> Result<Option<String>, RequestError> {
    match params.all(key) {
        Some(values) if values.len() > 1 => Err(repeated),
        Some(values) => Ok(values.first().map(|value| value.to_string())),
        None => Ok(None),
    }
}

/// Simple wrapper around an incoming GraphQL request
///
/// It can be built from both GET and POST API Gateway proxy events and
/// holds either a single request or a batch.
#[derive(Debug)]
pub struct GraphQLRequest(GraphQLBatchRequest);

impl GraphQLRequest {
    fn from_get(req: &ApiGatewayProxyRequest) -> Result<Self, RequestError> {
        let params = query_parameters(req);
        for (key, _) in params.iter() {
            if !matches!(key, "query" | "operationName" | "variables") {
                return Err(RequestError::ProhibitExtraField(key.to_owned()));
            }
        }

        let query = single_parameter(params, "query", RequestError::MultipleQueryParameter)?
            .filter(|query| !query.is_empty())
            .ok_or(RequestError::MissingQuery)?;
        let operation_name = single_parameter(
            params,
            "operationName",
            RequestError::MultipleOperationNameParameter,
        )?;
        let variables = single_parameter(
            params,
            "variables",
            RequestError::MultipleVariablesParameter,
        )?
        .map(|variables| {
            serde_json::from_str::<InputValue>(&variables)
                .map_err(|_| RequestError::InvalidVariablesParameter)
        })
        .transpose()?;

        Ok(Self(GraphQLBatchRequest::Single(GqlR::new(
            query,
            operation_name,
            variables,
        ))))
    }

    fn from_post(req: &ApiGatewayProxyRequest) -> Result<Self, RequestError> {
        let body = req.body.as_deref().ok_or(RequestError::MissingPostBody)?;
        let body = if req.is_base64_encoded {
            let raw = STANDARD
                .decode(body)
                .map_err(|_| RequestError::InvalidBody)?;
            String::from_utf8(raw).map_err(|_| RequestError::InvalidBody)?
        } else {
            body.to_owned()
        };
        match serde_json::from_str::<GraphQLBatchRequest>(&body) {
            Ok(GraphQLBatchRequest::Batch(requests)) if requests.is_empty() => {
                Err(RequestError::InvalidBody)
            }
            Ok(request) => Ok(Self(request)),
            Err(_) => Err(RequestError::InvalidBody),
        }
    }

    /// Execute an incoming GraphQL request
    pub async fn execute(
        &self,
        schema: &Schema,
        context: &Context,
    ) -> Result<ApiGatewayProxyResponse> {
        let response = self.0.execute(schema, context).await;
        let status_code = if response.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        let body = serde_json::to_string(&response)?;

        Ok(json(status_code, body))
    }

    /// Returns the operation names associated with this request.
    ///
    /// For batch requests there will be multiple names.
    pub fn operation_names(&self) -> Vec<Option<&str>> {
        self.0.operation_names()
    }
}

impl TryFrom<ApiGatewayProxyRequest> for GraphQLRequest {
    type Error = RequestError;

    fn try_from(req: ApiGatewayProxyRequest) -> Result<Self, Self::Error> {
        match req.http_method {
            Method::GET => Self::from_get(&req),
            Method::POST => Self::from_post(&req),
            ref raw_method => Err(RequestError::InvalidMethod(raw_method.clone())),
        }
    }
}

/// Constructs an error response outside of the normal execution flow
pub fn error(error: FieldError) -> Result<ApiGatewayProxyResponse> {
    let response = juniper_http::GraphQLResponse::error(error);
    let body = serde_json::to_string(&response)?;
    Ok(json(StatusCode::BAD_REQUEST, body))
}

/// Constructs a custom response outside of the normal execution flow
pub fn custom(
    status_code: StatusCode,
    response: serde_json::Value,
) -> Result<ApiGatewayProxyResponse> {
    let body = serde_json::to_string(&response)?;
    Ok(json(status_code, body))
}

/// Generate an HTML page containing GraphiQL
pub fn graphiql_source(graphql_endpoint_url: &str) -> ApiGatewayProxyResponse {
    html(juniper::http::graphiql::graphiql_source(
        graphql_endpoint_url,
        None,
    ))
}

/// Generate an HTML page containing GraphQL Playground
pub fn playground_source(graphql_endpoint_url: &str) -> ApiGatewayProxyResponse {
    html(juniper::http::playground::playground_source(
        graphql_endpoint_url,
        None,
    ))
}

/// Aws Api Gateway GraphQL Handler for GET and POST requests
///
/// Every invocation gets a fresh [`Context`] bound to the identity found in
/// the `Authorization` header.
#[derive(Clone)]
pub struct GraphQLHandler {
    schema: Arc<Schema>,
    data_sources: DataSources,
    playground_endpoint: Option<String>,
}

impl GraphQLHandler {
    pub fn new(schema: Schema, data_sources: DataSources) -> Self {
        Self {
            schema: Arc::new(schema),
            data_sources,
            playground_endpoint: None,
        }
    }

    /// Serve the GraphQL Playground, pointed at `endpoint`, on bare GET requests.
    pub fn with_playground<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.playground_endpoint = Some(endpoint.into());
        self
    }

    pub async fn call(&self, req: ApiGatewayProxyRequest) -> Result<ApiGatewayProxyResponse> {
        if let Some(endpoint) = &self.playground_endpoint {
            if req.http_method == Method::GET && query_parameters(&req).iter().next().is_none() {
                return Ok(playground_source(endpoint));
            }
        }

        let email = req
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(identity_from_authorization);

        let gql_req: GraphQLRequest = match req.try_into() {
            Ok(gql_req) => gql_req,
            Err(err) => {
                warn!(error = %err, "rejected graphql request");
                return error(FieldError::new(err, Value::null()));
            }
        };

        let span = info_span!(
            "graphql",
            operations = ?gql_req.operation_names(),
            authenticated = email.is_some()
        );
        let context = self.data_sources.context(email);
        gql_req
            .execute(&self.schema, &context)
            .instrument(span)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    fn get(params: std::collections::HashMap<String, Vec<String>>) -> ApiGatewayProxyRequest {
        ApiGatewayProxyRequest {
            http_method: Method::GET,
            multi_value_query_string_parameters: QueryMap::from(params),
            ..Default::default()
        }
    }

    fn post(body: &str) -> ApiGatewayProxyRequest {
        ApiGatewayProxyRequest {
            http_method: Method::POST,
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    fn single(request: GraphQLRequest) -> GqlR {
        match request.0 {
            GraphQLBatchRequest::Single(request) => request,
            GraphQLBatchRequest::Batch(_) => panic!("expected a single request"),
        }
    }

    #[test]
    fn get_reads_query_operation_and_variables() {
        let request = GraphQLRequest::try_from(get(hashmap! {
            "query".to_string() => vec!["query Launch($id: ID!) { launch(id: $id) { id } }".to_string()],
            "operationName".to_string() => vec!["Launch".to_string()],
            "variables".to_string() => vec![r#"{"id": "1"}"#.to_string()],
        }))
        .unwrap();

        assert_eq!(request.operation_names(), vec![Some("Launch")]);
        let request = single(request);
        assert!(request.query.starts_with("query Launch"));
        assert!(request.variables.is_some());
    }

    #[test]
    fn get_rejects_bad_parameters() {
        let cases = vec![
            (hashmap! {}, RequestError::MissingQuery),
            (
                hashmap! { "query".to_string() => vec!["{ a }".to_string(), "{ b }".to_string()] },
                RequestError::MultipleQueryParameter,
            ),
            (
                hashmap! {
                    "query".to_string() => vec!["{ a }".to_string()],
                    "operationName".to_string() => vec!["A".to_string(), "B".to_string()],
                },
                RequestError::MultipleOperationNameParameter,
            ),
            (
                hashmap! {
                    "query".to_string() => vec!["{ a }".to_string()],
                    "variables".to_string() => vec!["{not json".to_string()],
                },
                RequestError::InvalidVariablesParameter,
            ),
            (
                hashmap! {
                    "query".to_string() => vec!["{ a }".to_string()],
                    "extra".to_string() => vec!["1".to_string()],
                },
                RequestError::ProhibitExtraField("extra".to_string()),
            ),
        ];

        for (params, expected) in cases {
            assert_eq!(GraphQLRequest::try_from(get(params)).unwrap_err(), expected);
        }
    }

    #[test]
    fn post_accepts_single_and_batch_bodies() {
        let request =
            GraphQLRequest::try_from(post(r#"{"query": "{ launches { id } }"}"#)).unwrap();
        assert_eq!(request.operation_names(), vec![None]);

        let request = GraphQLRequest::try_from(post(
            r#"[{"query": "query A { me { id } }", "operationName": "A"}, {"query": "{ launches { id } }"}]"#,
        ))
        .unwrap();
        assert_eq!(request.operation_names(), vec![Some("A"), None]);
    }

    #[test]
    fn post_decodes_base64_body() {
        let mut req = post(&STANDARD.encode(r#"{"query": "{ me { id } }"}"#));
        req.is_base64_encoded = true;
        assert_eq!(single(GraphQLRequest::try_from(req).unwrap()).query, "{ me { id } }");
    }

    #[test]
    fn post_rejects_bad_bodies() {
        assert_eq!(
            GraphQLRequest::try_from(post("nope")).unwrap_err(),
            RequestError::InvalidBody
        );
        assert_eq!(
            GraphQLRequest::try_from(post("[]")).unwrap_err(),
            RequestError::InvalidBody
        );
        let mut req = post("");
        req.body = None;
        assert_eq!(
            GraphQLRequest::try_from(req).unwrap_err(),
            RequestError::MissingPostBody
        );
    }

    #[test]
    fn other_methods_are_rejected() {
        let req = ApiGatewayProxyRequest {
            http_method: Method::DELETE,
            ..Default::default()
        };
        assert_eq!(
            GraphQLRequest::try_from(req).unwrap_err(),
            RequestError::InvalidMethod(Method::DELETE)
        );
    }

    fn text_body(response: &ApiGatewayProxyResponse) -> &str {
        match &response.body {
            Some(Body::Text(text)) => text,
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn custom_keeps_status_and_json() {
        let response = custom(
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "reason": "maintenance" }),
        )
        .unwrap();

        assert_eq!(response.status_code, 503);
        assert_eq!(
            response.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body: serde_json::Value = serde_json::from_str(text_body(&response)).unwrap();
        assert_eq!(body, serde_json::json!({ "reason": "maintenance" }));
    }

    #[test]
    fn ide_pages_point_at_the_endpoint() {
        for response in [
            graphiql_source("/prod/graphql"),
            playground_source("/prod/graphql"),
        ] {
            assert_eq!(response.status_code, 200);
            assert_eq!(
                response.headers.get(header::CONTENT_TYPE).unwrap(),
                "text/html"
            );
            assert!(text_body(&response).contains("/prod/graphql"));
        }
    }
}
