//! Tenant-facing model and the seams the cleanup routine talks through.
//!
//! Remote calls return `Result` instead of value/metadata/error triples, so
//! a failed listing can never be iterated as if it were data.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Clone, PartialEq, Eq)]
pub struct TenantCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub cloud: Option<String>,
    pub vanity_domain: String,
}

impl std::fmt::Debug for TenantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("cloud", &self.cloud)
            .field("vanity_domain", &self.vanity_domain)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    UserDefined,
    SystemDefined,
}

impl CategoryKind {
    pub fn includes(self, category: &UrlCategory) -> bool {
        match self {
            Self::UserDefined => category.custom_category,
            Self::SystemDefined => !category.custom_category,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UrlCategory {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configured_name: Option<String>,
    #[serde(default)]
    pub custom_category: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("{operation} request failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{operation} response could not be decoded: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

/// An authenticated handle on one tenant. Held for a single cleanup call.
pub trait TenantSession {
    fn list_users(&self) -> Result<Vec<TenantUser>, TenantError>;

    fn list_categories(&self, kind: CategoryKind) -> Result<Vec<UrlCategory>, TenantError>;

    fn delete_category(&self, category_id: &str) -> Result<(), TenantError>;
}

pub trait TenantConnector {
    fn connect(&self, credentials: &TenantCredentials)
        -> Result<Box<dyn TenantSession>, TenantError>;
}

/// Authenticates and proves the session works by listing users.
pub fn login(
    connector: &dyn TenantConnector,
    credentials: &TenantCredentials,
) -> Result<Box<dyn TenantSession>, TenantError> {
    info!(
        component = "tenant",
        event = "login_started",
        vanity_domain = %credentials.vanity_domain,
        cloud = credentials.cloud.as_deref().unwrap_or("production"),
        "Login to tenant"
    );

    let session = connector.connect(credentials)?;
    match session.list_users() {
        Ok(users) => {
            info!(
                component = "tenant",
                event = "login_verified",
                user_count = users.len(),
                first_user = users.first().map(|user| user.name.as_str()).unwrap_or(""),
                "Tenant session verified"
            );
            Ok(session)
        }
        Err(err) => {
            error!(
                component = "tenant",
                event = "login_verification_failed",
                error = %err,
                "Tenant session could not list users"
            );
            Err(err)
        }
    }
}
