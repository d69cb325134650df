use std::time::Duration;

use tenant_nuke_core::records::DEFAULT_ENVIRONMENT;
use tenant_nuke_core::tenant::TenantCredentials;
use tracing::warn;

pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";
pub const CLIENT_ID_VAR: &str = "ZSCALER_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "ZSCALER_CLIENT_SECRET";
pub const VANITY_DOMAIN_VAR: &str = "ZSCALER_VANITY_DOMAIN";
pub const CLOUD_VAR: &str = "ZSCALER_CLOUD";
pub const CREDENTIALS_SECRET_VAR: &str = "ZSCALER_CREDENTIALS_SECRET_ID";
pub const TIME_RESERVE_VAR: &str = "NUKE_TIME_RESERVE_MS";
pub const DEFAULT_TIME_RESERVE_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub environment: String,
    pub credentials: Option<TenantCredentials>,
    pub credentials_secret_id: Option<String>,
    pub time_reserve: Duration,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Malformed values are logged and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            environment: non_empty(ENVIRONMENT_VAR)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            credentials: credentials_from(&non_empty),
            credentials_secret_id: non_empty(CREDENTIALS_SECRET_VAR),
            time_reserve: time_reserve_from(non_empty(TIME_RESERVE_VAR)),
        }
    }
}

fn time_reserve_from(raw: Option<String>) -> Duration {
    let default = Duration::from_millis(DEFAULT_TIME_RESERVE_MS);
    match raw {
        None => default,
        Some(raw) => match raw.parse::<u64>() {
            Ok(millis) => Duration::from_millis(millis),
            Err(_) => {
                warn!(
                    component = "config",
                    event = "invalid_time_reserve",
                    value = %raw,
                    default_ms = DEFAULT_TIME_RESERVE_MS,
                    "NUKE_TIME_RESERVE_MS is not a whole number of milliseconds; using the default"
                );
                default
            }
        },
    }
}

fn credentials_from(lookup: &impl Fn(&str) -> Option<String>) -> Option<TenantCredentials> {
    let client_id = lookup(CLIENT_ID_VAR);
    let client_secret = lookup(CLIENT_SECRET_VAR);
    let vanity_domain = lookup(VANITY_DOMAIN_VAR);

    match (client_id, client_secret, vanity_domain) {
        (Some(client_id), Some(client_secret), Some(vanity_domain)) => Some(TenantCredentials {
            client_id,
            client_secret,
            cloud: lookup(CLOUD_VAR),
            vanity_domain,
        }),
        (None, None, None) => None,
        _ => {
            warn!(
                component = "config",
                event = "partial_credentials",
                "Ignoring incomplete tenant credentials; ZSCALER_CLIENT_ID, ZSCALER_CLIENT_SECRET and ZSCALER_VANITY_DOMAIN must all be set"
            );
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsError {
    #[error("failed to fetch credentials secret: {0}")]
    Fetch(String),
    #[error("credentials secret is not valid JSON: {0}")]
    Decode(String),
    #[error("credentials secret is missing {0}")]
    Incomplete(&'static str),
}

/// Resolves tenant credentials only when a cleanup actually needs them.
pub trait CredentialsProvider {
    fn credentials(&self) -> Result<Option<TenantCredentials>, CredentialsError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<TenantCredentials>);

impl CredentialsProvider for StaticCredentials {
    fn credentials(&self) -> Result<Option<TenantCredentials>, CredentialsError> {
        Ok(self.0.clone())
    }
}
