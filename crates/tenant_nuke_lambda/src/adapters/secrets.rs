use serde::Deserialize;
use tenant_nuke_core::tenant::TenantCredentials;

use crate::adapters::block_on;
use crate::config::{CredentialsError, CredentialsProvider};

/// Secret layout: `{"clientId", "clientSecret", "vanityDomain", "cloud"?}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretPayload {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    vanity_domain: String,
    #[serde(default)]
    cloud: Option<String>,
}

pub fn parse_secret(secret: &str) -> Result<TenantCredentials, CredentialsError> {
    let payload: SecretPayload = serde_json::from_str(secret)
        .map_err(|error| CredentialsError::Decode(error.to_string()))?;

    if payload.client_id.trim().is_empty() {
        return Err(CredentialsError::Incomplete("clientId"));
    }
    if payload.client_secret.trim().is_empty() {
        return Err(CredentialsError::Incomplete("clientSecret"));
    }
    if payload.vanity_domain.trim().is_empty() {
        return Err(CredentialsError::Incomplete("vanityDomain"));
    }

    Ok(TenantCredentials {
        client_id: payload.client_id,
        client_secret: payload.client_secret,
        cloud: payload.cloud.filter(|cloud| !cloud.trim().is_empty()),
        vanity_domain: payload.vanity_domain,
    })
}

pub struct SecretsManagerCredentials {
    client: aws_sdk_secretsmanager::Client,
    secret_id: String,
}

impl SecretsManagerCredentials {
    pub fn new(client: aws_sdk_secretsmanager::Client, secret_id: impl Into<String>) -> Self {
        Self {
            client,
            secret_id: secret_id.into(),
        }
    }
}

impl CredentialsProvider for SecretsManagerCredentials {
    fn credentials(&self) -> Result<Option<TenantCredentials>, CredentialsError> {
        let client = self.client.clone();
        let secret_id = self.secret_id.clone();

        let secret = block_on(async move {
            client
                .get_secret_value()
                .secret_id(secret_id)
                .send()
                .await
                .map_err(|error| CredentialsError::Fetch(error.to_string()))
        })?;

        let text = secret
            .secret_string()
            .ok_or(CredentialsError::Incomplete("SecretString"))?;
        parse_secret(text).map(Some)
    }
}
