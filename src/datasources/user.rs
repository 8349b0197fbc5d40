use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};
use validator::ValidateEmail;

use crate::datasources::Store;
use crate::error::Result;
use crate::types::User;

/// Access to the requesting user and their bookings.
#[async_trait]
pub trait UserApi: Send + Sync {
    /// `None` when the request carries no usable identity.
    async fn find_or_create_user(&self) -> Result<Option<User>>;

    async fn is_booked_on_launch(&self, launch_id: i32) -> Result<bool>;

    async fn get_launch_ids_by_user(&self) -> Result<Vec<i32>>;
}

///
/// User store access bound to the identity of one request
///
#[derive(Debug, Clone)]
pub struct UserDataSource {
    store: Arc<Store>,
    email: Option<String>,
}

impl UserDataSource {
    pub fn new(store: Arc<Store>, email: Option<String>) -> Self {
        Self { store, email }
    }

    fn valid_email(&self) -> Option<&str> {
        self.email
            .as_ref()
            .filter(|email| email.validate_email())
            .map(String::as_str)
    }

    fn current_user(&self) -> Option<User> {
        self.valid_email().and_then(|email| self.store.find_user(email))
    }
}

#[async_trait]
impl UserApi for UserDataSource {
    #[instrument(skip(self))]
    async fn find_or_create_user(&self) -> Result<Option<User>> {
        match self.valid_email() {
            Some(email) => {
                // creating a user rewrites the snapshot file
                let store = Arc::clone(&self.store);
                let email = email.to_owned();
                let user =
                    tokio::task::spawn_blocking(move || store.find_or_create_user(&email))
                        .await??;
                Ok(Some(user))
            }
            None => {
                debug!("anonymous request");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn is_booked_on_launch(&self, launch_id: i32) -> Result<bool> {
        Ok(self
            .current_user()
            .map(|user| self.store.is_booked(user.id, launch_id))
            .unwrap_or(false))
    }

    #[instrument(skip(self))]
    async fn get_launch_ids_by_user(&self) -> Result<Vec<i32>> {
        Ok(self
            .current_user()
            .map(|user| self.store.launch_ids_by_user(user.id))
            .unwrap_or_default())
    }
}
