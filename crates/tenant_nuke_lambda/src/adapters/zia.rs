//! ZIA client over the OneAPI surface: OAuth2 client-credentials login
//! against the tenant's ZIdentity domain, then bearer-authenticated REST.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tenant_nuke_core::tenant::{
    CategoryKind, TenantConnector, TenantCredentials, TenantError, TenantSession, TenantUser,
    UrlCategory,
};

use crate::adapters::block_on;

pub const TOKEN_AUDIENCE: &str = "https://api.zscaler.com";
const PRODUCTION_CLOUD: &str = "production";
const URL_CATEGORIES_PATH: &str = "/zia/api/v1/urlCategories";
const USERS_PATH: &str = "/zia/api/v1/users";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZiaEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl ZiaEndpoints {
    pub fn for_tenant(vanity_domain: &str, cloud: Option<&str>) -> Self {
        let cloud = cloud
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(PRODUCTION_CLOUD))
            .map(str::to_ascii_lowercase);

        match cloud {
            Some(cloud) => Self {
                token_url: format!("https://{vanity_domain}.zslogin{cloud}.net/oauth2/v1/token"),
                api_base: format!("https://api.{cloud}.zsapi.net"),
            },
            None => Self {
                token_url: format!("https://{vanity_domain}.zslogin.net/oauth2/v1/token"),
                api_base: "https://api.zsapi.net".to_string(),
            },
        }
    }
}

pub fn categories_path(kind: CategoryKind) -> String {
    match kind {
        CategoryKind::UserDefined => format!("{URL_CATEGORIES_PATH}?customOnly=true"),
        CategoryKind::SystemDefined => URL_CATEGORIES_PATH.to_string(),
    }
}

pub fn category_path(category_id: &str) -> String {
    format!("{URL_CATEGORIES_PATH}/{category_id}")
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct ZiaConnector {
    http: reqwest::Client,
}

impl ZiaConnector {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl TenantConnector for ZiaConnector {
    fn connect(
        &self,
        credentials: &TenantCredentials,
    ) -> Result<Box<dyn TenantSession>, TenantError> {
        let endpoints =
            ZiaEndpoints::for_tenant(&credentials.vanity_domain, credentials.cloud.as_deref());
        let http = self.http.clone();
        let token_url = endpoints.token_url.clone();
        let form = [
            ("grant_type", "client_credentials".to_string()),
            ("client_id", credentials.client_id.clone()),
            ("client_secret", credentials.client_secret.clone()),
            ("audience", TOKEN_AUDIENCE.to_string()),
        ];

        let token = block_on(async move {
            let response = http
                .post(token_url)
                .form(&form)
                .send()
                .await
                .map_err(|error| TenantError::Authentication(error.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TenantError::Authentication(format!(
                    "token endpoint returned HTTP {}: {body}",
                    status.as_u16()
                )));
            }
            response
                .json::<TokenResponse>()
                .await
                .map_err(|error| TenantError::Authentication(error.to_string()))
        })?;

        Ok(Box::new(ZiaSession {
            http: self.http.clone(),
            api_base: endpoints.api_base,
            access_token: token.access_token,
        }))
    }
}

pub struct ZiaSession {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl ZiaSession {
    fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, TenantError> {
        let request = self
            .http
            .get(format!("{}{path}", self.api_base))
            .bearer_auth(&self.access_token);

        block_on(async move {
            let response = request.send().await.map_err(|error| TenantError::Transport {
                operation,
                message: error.to_string(),
            })?;
            let response = check_status(operation, response).await?;
            response
                .json::<T>()
                .await
                .map_err(|error| TenantError::Decode {
                    operation,
                    message: error.to_string(),
                })
        })
    }
}

async fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, TenantError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TenantError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

impl TenantSession for ZiaSession {
    fn list_users(&self) -> Result<Vec<TenantUser>, TenantError> {
        self.get_json("list_users", USERS_PATH)
    }

    fn list_categories(&self, kind: CategoryKind) -> Result<Vec<UrlCategory>, TenantError> {
        let categories: Vec<UrlCategory> =
            self.get_json("list_categories", &categories_path(kind))?;
        Ok(categories
            .into_iter()
            .filter(|category| kind.includes(category))
            .collect())
    }

    fn delete_category(&self, category_id: &str) -> Result<(), TenantError> {
        let operation = "delete_category";
        let request = self
            .http
            .delete(format!("{}{}", self.api_base, category_path(category_id)))
            .bearer_auth(&self.access_token);

        block_on(async move {
            let response = request.send().await.map_err(|error| TenantError::Transport {
                operation,
                message: error.to_string(),
            })?;
            check_status(operation, response).await.map(|_| ())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_endpoints_have_no_cloud_segment() {
        let expected = ZiaEndpoints {
            token_url: "https://acme.zslogin.net/oauth2/v1/token".to_string(),
            api_base: "https://api.zsapi.net".to_string(),
        };
        assert_eq!(ZiaEndpoints::for_tenant("acme", None), expected);
        assert_eq!(ZiaEndpoints::for_tenant("acme", Some("")), expected);
        assert_eq!(ZiaEndpoints::for_tenant("acme", Some("PRODUCTION")), expected);
    }

    #[test]
    fn named_cloud_is_lowercased_into_both_hosts() {
        let endpoints = ZiaEndpoints::for_tenant("acme", Some("Beta"));
        assert_eq!(
            endpoints.token_url,
            "https://acme.zsloginbeta.net/oauth2/v1/token"
        );
        assert_eq!(endpoints.api_base, "https://api.beta.zsapi.net");
    }

    #[test]
    fn category_paths_match_api_routes() {
        assert_eq!(
            categories_path(CategoryKind::UserDefined),
            "/zia/api/v1/urlCategories?customOnly=true"
        );
        assert_eq!(
            categories_path(CategoryKind::SystemDefined),
            "/zia/api/v1/urlCategories"
        );
        assert_eq!(
            category_path("CUSTOM_07"),
            "/zia/api/v1/urlCategories/CUSTOM_07"
        );
    }

    #[test]
    fn token_response_ignores_extra_fields() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600}"#,
        )
        .expect("token should decode");
        assert_eq!(token.access_token, "abc");
    }
}
