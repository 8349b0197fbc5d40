use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::datasources::{LaunchApi, Store, UserApi, UserDataSource};

///
/// Request scoped context for Juniper
///
/// Built fresh for every request, it carries the collaborators every
/// resolver delegates to.
pub struct Context {
    launch_api: Arc<dyn LaunchApi>,
    user_api: Arc<dyn UserApi>,
}

impl juniper::Context for Context {}

impl Context {
    pub fn new(launch_api: Arc<dyn LaunchApi>, user_api: Arc<dyn UserApi>) -> Self {
        Self {
            launch_api,
            user_api,
        }
    }

    pub fn launch_api(&self) -> &dyn LaunchApi {
        self.launch_api.as_ref()
    }

    pub fn user_api(&self) -> &dyn UserApi {
        self.user_api.as_ref()
    }
}

///
/// Long lived collaborators shared by all requests
///
#[derive(Clone)]
pub struct DataSources {
    launch_api: Arc<dyn LaunchApi>,
    store: Arc<Store>,
}

impl DataSources {
    pub fn new(launch_api: Arc<dyn LaunchApi>, store: Arc<Store>) -> Self {
        Self { launch_api, store }
    }

    /// Context for a request made on behalf of `email`, anonymous when `None`.
    pub fn context(&self, email: Option<String>) -> Context {
        Context::new(
            Arc::clone(&self.launch_api),
            Arc::new(UserDataSource::new(Arc::clone(&self.store), email)),
        )
    }
}

/// Decodes the user email carried base64 encoded in an `Authorization` header value.
pub fn identity_from_authorization(value: &str) -> Option<String> {
    let token = value.trim();
    let token = token
        .strip_prefix("Bearer ")
        .or_else(|| token.strip_prefix("Basic "))
        .unwrap_or(token)
        .trim();
    if token.is_empty() {
        return None;
    }
    let decoded = STANDARD.decode(token).ok()?;
    String::from_utf8(decoded)
        .ok()
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty())
}
