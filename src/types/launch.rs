use juniper::{graphql_object, FieldResult, GraphQLObject, ID};

use crate::context::Context;
use crate::types::Mission;

///
/// GraphQL type for the rocket flying a launch
///
#[derive(GraphQLObject, Clone, Debug, PartialEq)]
#[graphql(context = Context)]
pub struct Rocket {
    pub id: ID,
    pub name: Option<String>,
    #[graphql(name = "type")]
    pub rocket_type: Option<String>,
}

///
/// GraphQL type for a single launch of the catalog
///
/// Booking status is not part of the record, it is asked from the user
/// store every time the field is resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct Launch {
    /// flight number in the launch catalog
    pub id: i32,
    pub site: Option<String>,
    pub mission: Mission,
    pub rocket: Rocket,
}

#[graphql_object(context = Context)]
impl Launch {
    fn id(&self) -> ID {
        ID::new(self.id.to_string())
    }

    /// Name of the launch site
    fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    fn mission(&self) -> &Mission {
        &self.mission
    }

    fn rocket(&self) -> &Rocket {
        &self.rocket
    }

    ///
    /// Whether the requesting user has a trip booked on this launch
    ///
    async fn is_booked(&self, context: &Context) -> FieldResult<bool> {
        Ok(context.user_api().is_booked_on_launch(self.id).await?)
    }
}
