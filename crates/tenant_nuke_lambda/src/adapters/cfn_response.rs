use tenant_nuke_core::contract::ResponseDocument;

use crate::adapters::block_on;

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("request carries no ResponseURL")]
    MissingUrl,
    #[error("failed to serialize response document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to deliver response: {0}")]
    Transport(String),
    #[error("response URL returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Delivers the outcome of a lifecycle request back to CloudFormation.
pub trait ResponseSignaler {
    fn send(&self, response_url: &str, document: &ResponseDocument) -> Result<(), SignalError>;
}

pub fn encode_document(document: &ResponseDocument) -> Result<String, SignalError> {
    Ok(serde_json::to_string(document)?)
}

/// PUTs the document to the pre-signed S3 URL. The URL is signed without a
/// content type, so the header is sent empty.
#[derive(Debug, Clone)]
pub struct HttpResponseSignaler {
    http: reqwest::Client,
}

impl HttpResponseSignaler {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ResponseSignaler for HttpResponseSignaler {
    fn send(&self, response_url: &str, document: &ResponseDocument) -> Result<(), SignalError> {
        if response_url.trim().is_empty() {
            return Err(SignalError::MissingUrl);
        }

        let body = encode_document(document)?;
        let request = self
            .http
            .put(response_url)
            .header(reqwest::header::CONTENT_TYPE, "")
            .body(body);

        block_on(async move {
            let response = request
                .send()
                .await
                .map_err(|error| SignalError::Transport(error.to_string()))?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(SignalError::Status {
                status: status.as_u16(),
                body,
            })
        })
    }
}
