use std::sync::Arc;

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use lambda_runtime::{service_fn, LambdaEvent};
use space_launch_gateway::datasources::{SpaceXLaunchApi, Store};
use space_launch_gateway::{schema, Config, DataSources, GraphQLHandler};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Error = lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .without_time()
        .init();

    let config = Config::from_env()?;
    let store = match &config.user_store_path {
        Some(path) => Store::open(path)?,
        None => Store::in_memory(),
    };
    let launch_api = SpaceXLaunchApi::new(&config.launch_api_url, config.launch_api_timeout)?;
    let data_sources = DataSources::new(Arc::new(launch_api), Arc::new(store));

    let mut handler = GraphQLHandler::new(schema(), data_sources);
    if config.playground {
        handler = handler.with_playground(config.endpoint.as_str());
    }
    let handler = Arc::new(handler);

    info!(launch_api = %config.launch_api_url, "space launch gateway ready");

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<ApiGatewayProxyRequest>| {
            let handler = Arc::clone(&handler);
            async move { handler.call(event.payload).await.map_err(Error::from) }
        },
    ))
    .await
}
