use juniper::{graphql_object, FieldResult, ID};
use tracing::debug;

use crate::context::Context;
use crate::types::Launch;

///
/// GraphQL type for a user
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// unique identification of user
    pub id: i32,
    /// Email
    pub email: String,
}

impl User {
    pub fn new<S: Into<String>>(id: i32, email: S) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

#[graphql_object(context = Context)]
impl User {
    fn id(&self) -> ID {
        ID::new(self.id.to_string())
    }

    fn email(&self) -> &str {
        &self.email
    }

    ///
    /// Launches the user has booked, in the order the catalog returns them
    ///
    async fn trips(&self, context: &Context) -> FieldResult<Vec<Launch>> {
        let launch_ids = context.user_api().get_launch_ids_by_user().await?;
        if launch_ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = launch_ids.len(), "resolving booked launches");
        let launches = context
            .launch_api()
            .get_launches_by_ids(&launch_ids)
            .await?;
        Ok(launches.unwrap_or_default())
    }
}
