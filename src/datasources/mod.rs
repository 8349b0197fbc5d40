//! Collaborators the resolvers delegate all data access to.

pub mod launch;
pub mod store;
pub mod user;

pub use launch::{LaunchApi, SpaceXLaunchApi};
pub use store::Store;
pub use user::{UserApi, UserDataSource};
