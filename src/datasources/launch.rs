use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use juniper::ID;
use reqwest::{Client, Url};
use serde_derive::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::types::{Launch, Mission, Rocket};

/// Read access to the remote launch catalog.
#[async_trait]
pub trait LaunchApi: Send + Sync {
    async fn get_all_launches(&self) -> Result<Vec<Launch>>;

    /// `None` when the catalog has no launch with this flight number.
    async fn get_launch_by_id(&self, launch_id: i32) -> Result<Option<Launch>>;

    /// Launches for `launch_ids`, `None` when the catalog signals no result.
    async fn get_launches_by_ids(&self, launch_ids: &[i32]) -> Result<Option<Vec<Launch>>>;
}

#[derive(Debug, Deserialize)]
struct LaunchRecord {
    flight_number: Option<i32>,
    mission_name: Option<String>,
    #[serde(default)]
    rocket: RocketRecord,
    launch_site: Option<LaunchSiteRecord>,
    #[serde(default)]
    links: LinksRecord,
}

#[derive(Debug, Default, Deserialize)]
struct RocketRecord {
    #[serde(default)]
    rocket_id: String,
    rocket_name: Option<String>,
    rocket_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LaunchSiteRecord {
    site_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksRecord {
    mission_patch: Option<String>,
    mission_patch_small: Option<String>,
}

impl From<LaunchRecord> for Launch {
    fn from(record: LaunchRecord) -> Self {
        Self {
            id: record.flight_number.unwrap_or(0),
            site: record.launch_site.and_then(|site| site.site_name),
            mission: Mission {
                name: record.mission_name,
                mission_patch_small: record.links.mission_patch_small,
                mission_patch_large: record.links.mission_patch,
            },
            rocket: Rocket {
                id: ID::new(record.rocket.rocket_id),
                name: record.rocket.rocket_name,
                rocket_type: record.rocket.rocket_type,
            },
        }
    }
}

///
/// Client of the SpaceX v2 REST API
///
#[derive(Debug, Clone)]
pub struct SpaceXLaunchApi {
    client: Client,
    launches_url: Url,
}

impl SpaceXLaunchApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        // Url::join drops the last segment of a base without trailing slash
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let launches_url = Url::parse(&base_url)
            .and_then(|base| base.join("launches"))
            .map_err(|err| Error::Config(format!("invalid launch api url {base_url}: {err}")))?;
        Ok(Self {
            client,
            launches_url,
        })
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<Vec<LaunchRecord>> {
        let records = self
            .client
            .get(self.launches_url.clone())
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<LaunchRecord>>()
            .await?;
        debug!(count = records.len(), "fetched launch records");
        Ok(records)
    }
}

#[async_trait]
impl LaunchApi for SpaceXLaunchApi {
    #[instrument(skip(self))]
    async fn get_all_launches(&self) -> Result<Vec<Launch>> {
        let records = self.fetch(&[]).await?;
        Ok(records.into_iter().map(Launch::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_launch_by_id(&self, launch_id: i32) -> Result<Option<Launch>> {
        let records = self
            .fetch(&[("flight_number", launch_id.to_string())])
            .await?;
        Ok(records.into_iter().next().map(Launch::from))
    }

    #[instrument(skip(self))]
    async fn get_launches_by_ids(&self, launch_ids: &[i32]) -> Result<Option<Vec<Launch>>> {
        let launches = try_join_all(
            launch_ids
                .iter()
                .map(|launch_id| self.get_launch_by_id(*launch_id)),
        )
        .await?;
        Ok(Some(launches.into_iter().flatten().collect()))
    }
}
