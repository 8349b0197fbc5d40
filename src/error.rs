use thiserror::Error;

/// Failures raised by the gateway's collaborators and its bootstrap.
///
/// Resolvers hand these to juniper unchanged, which reports them in the
/// `errors` list of the GraphQL response.
#[derive(Debug, Error)]
pub enum Error {
    #[error("launch catalog request failed: {0}")]
    LaunchCatalog(#[from] reqwest::Error),
    #[error("user store i/o failed: {0}")]
    StoreIo(#[from] std::io::Error),
    #[error("user store ran out of ids for {0}")]
    StoreExhausted(&'static str),
    #[error("user store task failed: {0}")]
    StoreTask(#[from] tokio::task::JoinError),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
