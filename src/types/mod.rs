pub mod launch;
pub mod mission;
pub mod query;
pub mod user;

pub use launch::{Launch, Rocket};
pub use mission::{Mission, PatchSize};
pub use query::{schema, Query, Schema};
pub use user::User;
