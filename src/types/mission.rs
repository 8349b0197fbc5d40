use juniper::{graphql_object, GraphQLEnum};

use crate::context::Context;

///
/// Size variant of a mission patch image
///
#[derive(GraphQLEnum, Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PatchSize {
    Small,
    #[default]
    Large,
}

///
/// GraphQL type for mission metadata embedded in a launch
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mission {
    pub name: Option<String>,
    pub mission_patch_small: Option<String>,
    pub mission_patch_large: Option<String>,
}

impl Mission {
    /// Picks the stored patch image for `size`, large when no size is given.
    pub fn patch(&self, size: Option<PatchSize>) -> Option<&str> {
        match size.unwrap_or_default() {
            PatchSize::Small => self.mission_patch_small.as_deref(),
            PatchSize::Large => self.mission_patch_large.as_deref(),
        }
    }
}

#[graphql_object(context = Context)]
impl Mission {
    /// Name of the mission
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Url of the mission patch image, the large variant by default.
    /// Sizes outside of `PatchSize` fail validation.
    fn mission_patch(&self, size: Option<PatchSize>) -> Option<&str> {
        self.patch(size)
    }
}
