use juniper::{graphql_object, EmptyMutation, EmptySubscription, FieldResult, RootNode, ID};
use tracing::debug;

use crate::context::Context;
use crate::types::{Launch, User};

pub struct Query;

#[graphql_object(context = Context)]
impl Query {
    ///
    /// All launches of the catalog
    ///
    async fn launches(context: &Context) -> FieldResult<Vec<Launch>> {
        Ok(context.launch_api().get_all_launches().await?)
    }

    ///
    /// Single launch by its flight number, null when the catalog has no such launch
    ///
    async fn launch(context: &Context, id: ID) -> FieldResult<Option<Launch>> {
        let raw: &str = &id;
        let launch_id = match raw.parse::<i32>() {
            Ok(launch_id) => launch_id,
            Err(_) => {
                debug!(id = raw, "launch id is not a flight number");
                return Ok(None);
            }
        };
        Ok(context.launch_api().get_launch_by_id(launch_id).await?)
    }

    ///
    /// The requesting user, registered on first sight
    ///
    async fn me(context: &Context) -> FieldResult<Option<User>> {
        Ok(context.user_api().find_or_create_user().await?)
    }
}

pub type Schema = RootNode<'static, Query, EmptyMutation<Context>, EmptySubscription<Context>>;

pub fn schema() -> Schema {
    Schema::new(Query, EmptyMutation::new(), EmptySubscription::new())
}
