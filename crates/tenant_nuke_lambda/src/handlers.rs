pub mod cfn;
pub mod direct;

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tenant_nuke_core::contract::{classify, Invocation};
use tenant_nuke_core::tenant::TenantConnector;
use tracing::info;

use crate::adapters::cfn_response::ResponseSignaler;
use crate::config::{CredentialsProvider, RuntimeConfig};

/// Per-invocation facts taken from the Lambda context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub log_stream_name: String,
    pub deadline: Option<Instant>,
    pub now: DateTime<Utc>,
}

pub struct Collaborators<'a> {
    pub connector: &'a dyn TenantConnector,
    pub credentials: &'a dyn CredentialsProvider,
    pub signaler: &'a dyn ResponseSignaler,
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("malformed CloudFormation request: {0}")]
    MalformedRequest(#[source] serde_json::Error),
    #[error("failed to serialize handler response: {0}")]
    Serialization(#[source] serde_json::Error),
}

pub fn handle_event(
    event: Value,
    context: &InvocationContext,
    config: &RuntimeConfig,
    deps: &Collaborators<'_>,
) -> Result<Value, HandlerError> {
    info!(
        component = "dispatcher",
        event = "event_received",
        request_id = %context.request_id,
        payload = %event,
        "Event received"
    );
    info!(
        component = "dispatcher",
        event = "environment",
        environment = %config.environment,
        "Environment: {}",
        config.environment
    );

    match classify(event) {
        Invocation::CloudFormation(event) => {
            let outcome = cfn::handle_cfn_event(event, context, config, deps)?;
            serde_json::to_value(outcome).map_err(HandlerError::Serialization)
        }
        Invocation::Direct(event) => {
            let response =
                direct::handle_direct_invocation(&event, &config.environment, context.now);
            serde_json::to_value(response).map_err(HandlerError::Serialization)
        }
    }
}
