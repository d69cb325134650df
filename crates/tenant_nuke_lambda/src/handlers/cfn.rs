use serde::Serialize;
use serde_json::Value;
use tenant_nuke_core::contract::{
    build_response_document, CfnRequest, CfnSignal, LifecycleVerb, ResponseDocument,
};
use tenant_nuke_core::nuke::{nuke_tenant, nuke_tenant_within, NukeError, NukeSummary, TimeBudget};
use tenant_nuke_core::records::{
    LifecycleRecord, RecordKind, CATEGORIES_DELETED_KEY, PHYSICAL_RESOURCE_ID_KEY,
};
use tenant_nuke_core::tenant::{login, TenantError};
use tracing::{error, info};

use super::{Collaborators, HandlerError, InvocationContext};
use crate::config::{CredentialsError, RuntimeConfig};

/// Resource property that opts a Create into tenant cleanup.
pub const NUKE_TENANT_PROPERTY: &str = "NukeTenant";

#[derive(Debug, thiserror::Error)]
pub enum CfnError {
    #[error("NukeTenant must be true or false, got {0}")]
    InvalidNukeFlag(String),
    #[error("tenant cleanup requested but no tenant credentials are configured")]
    MissingCredentials,
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error("tenant login failed: {0}")]
    Login(#[source] TenantError),
    #[error("tenant cleanup failed: {0}")]
    Nuke(#[from] NukeError),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CfnOutcome {
    pub document: ResponseDocument,
    pub delivered: bool,
}

pub fn nuke_requested(request: &CfnRequest) -> Result<bool, CfnError> {
    match request.resource_properties.get(NUKE_TENANT_PROPERTY) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            _ => Err(CfnError::InvalidNukeFlag(text.clone())),
        },
        Some(other) => Err(CfnError::InvalidNukeFlag(other.to_string())),
    }
}

pub fn handle_cfn_event(
    event: Value,
    context: &InvocationContext,
    config: &RuntimeConfig,
    deps: &Collaborators<'_>,
) -> Result<CfnOutcome, HandlerError> {
    let (request, signal) = match CfnRequest::from_event(event.clone()) {
        Ok(request) => {
            let signal = process_cfn_request(&request, context, config, deps);
            (request, signal)
        }
        Err(err) => {
            let request = CfnRequest::addressing_from(&event);
            if request.response_url.is_empty() {
                return Err(HandlerError::MalformedRequest(err));
            }
            error!(
                component = "cfn_handler",
                event = "request_malformed",
                request_id = %request.request_id,
                error = %err,
                "Could not decode CloudFormation request"
            );
            let signal = CfnSignal::failure(HandlerError::MalformedRequest(err).to_string());
            (request, signal)
        }
    };

    let document = build_response_document(&request, &signal, &context.log_stream_name);
    let delivered = match deps.signaler.send(&request.response_url, &document) {
        Ok(()) => true,
        Err(err) => {
            error!(
                component = "cfn_handler",
                event = "signal_failed",
                request_id = %request.request_id,
                error = %err,
                "Could not deliver CloudFormation response"
            );
            false
        }
    };

    info!(
        component = "cfn_handler",
        event = "request_completed",
        request_type = %request.verb(),
        status = ?document.status,
        physical_resource_id = %document.physical_resource_id,
        delivered,
        "CloudFormation request completed"
    );
    Ok(CfnOutcome {
        document,
        delivered,
    })
}

/// Turns one lifecycle request into a signal. Never fails: every error
/// becomes a FAILED signal carrying the error text.
pub fn process_cfn_request(
    request: &CfnRequest,
    context: &InvocationContext,
    config: &RuntimeConfig,
    deps: &Collaborators<'_>,
) -> CfnSignal {
    let verb = request.verb();
    info!(
        component = "cfn_handler",
        event = "request_started",
        request_type = %verb,
        "Processing CloudFormation {verb} request"
    );

    match run_lifecycle(&verb, request, context, config, deps) {
        Ok(signal) => signal,
        Err(err) => {
            error!(
                component = "cfn_handler",
                event = "request_failed",
                request_type = %verb,
                error = %err,
                "Error in CloudFormation handler"
            );
            CfnSignal::failure(err.to_string())
        }
    }
}

fn run_lifecycle(
    verb: &LifecycleVerb,
    request: &CfnRequest,
    context: &InvocationContext,
    config: &RuntimeConfig,
    deps: &Collaborators<'_>,
) -> Result<CfnSignal, CfnError> {
    let kind = match verb {
        LifecycleVerb::Create => RecordKind::Create,
        LifecycleVerb::Update => RecordKind::Update,
        LifecycleVerb::Delete => RecordKind::Delete,
        LifecycleVerb::Unrecognized(value) => {
            return Ok(CfnSignal::failure(format!("Unknown request type: {value}")));
        }
    };

    let summary = if kind == RecordKind::Create && nuke_requested(request)? {
        Some(run_cleanup(context, config, deps)?)
    } else {
        None
    };

    let record = LifecycleRecord::new(kind, request, &config.environment, context.now);
    info!(
        component = "cfn_handler",
        event = "record_built",
        record = %serde_json::to_value(&record).unwrap_or_default(),
        "Built {} record",
        verb
    );

    let mut data = record.response_data();
    if let Some(summary) = summary {
        data.insert(CATEGORIES_DELETED_KEY.to_string(), Value::from(summary.deleted));
    }

    let physical_resource_id = match kind {
        RecordKind::Update => None,
        RecordKind::Create | RecordKind::Delete => Some(context.log_stream_name.clone()),
    };
    if let Some(id) = &physical_resource_id {
        data.insert(PHYSICAL_RESOURCE_ID_KEY.to_string(), Value::from(id.clone()));
    }

    Ok(CfnSignal::success(data, physical_resource_id))
}

fn run_cleanup(
    context: &InvocationContext,
    config: &RuntimeConfig,
    deps: &Collaborators<'_>,
) -> Result<NukeSummary, CfnError> {
    let credentials = deps
        .credentials
        .credentials()?
        .ok_or(CfnError::MissingCredentials)?;
    let session = login(deps.connector, &credentials).map_err(CfnError::Login)?;

    let summary = match context.deadline {
        Some(deadline) => {
            nuke_tenant_within(session.as_ref(), &TimeBudget::new(deadline, config.time_reserve))?
        }
        None => nuke_tenant(session.as_ref())?,
    };
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;
    use tenant_nuke_core::contract::SignalStatus;

    use super::*;
    use crate::config::StaticCredentials;
    use crate::handlers::test_support::*;

    fn event(request_type: &str, properties: Value) -> Value {
        json!({
            "RequestType": request_type,
            "ResponseURL": "https://cloudformation-custom-resource-response.s3.amazonaws.com/r",
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/nuke/5f1c-guid",
            "RequestId": "cfn-request-1",
            "LogicalResourceId": "TenantNuke",
            "PhysicalResourceId": "existing-physical-id",
            "ResourceType": "Custom::TenantNuke",
            "ResourceProperties": properties
        })
    }

    fn run(
        event: Value,
        tenant: &FakeTenant,
        credentials: &StaticCredentials,
    ) -> (CfnOutcome, Vec<ResponseDocument>) {
        let signaler = RecordingSignaler::default();
        let deps = Collaborators {
            connector: tenant,
            credentials,
            signaler: &signaler,
        };
        let outcome = handle_cfn_event(event, &context(), &config("dev"), &deps)
            .expect("request should decode");
        (outcome, signaler.documents())
    }

    #[test]
    fn create_signals_success_with_log_stream_physical_id() {
        let tenant = FakeTenant::default();
        let (outcome, sent) = run(
            event("Create", json!({})),
            &tenant,
            &StaticCredentials(None),
        );

        assert_eq!(sent, vec![outcome.document.clone()]);
        let document = outcome.document;
        assert_eq!(document.status, SignalStatus::Success);
        assert_eq!(document.physical_resource_id, LOG_STREAM);
        assert_eq!(document.data[PHYSICAL_RESOURCE_ID_KEY], LOG_STREAM);
        assert_eq!(document.data["StackName"], "5f1c-guid");
        assert_eq!(document.data["Environment"], "dev");
        assert_eq!(document.data["DeploymentTime"], "2026-10-19T12:00:00.000000");
        assert!(tenant.calls().is_empty());
    }

    #[test]
    fn delete_signals_success_with_log_stream_physical_id() {
        let tenant = FakeTenant::with_categories(&["CUSTOM_01"]);
        let (outcome, _) = run(
            event("Delete", json!({"NukeTenant": "true"})),
            &tenant,
            &credentials(),
        );

        assert_eq!(outcome.document.status, SignalStatus::Success);
        assert_eq!(outcome.document.physical_resource_id, LOG_STREAM);
        assert!(outcome.document.data.contains_key("DeletionTime"));
        assert!(tenant.calls().is_empty());
    }

    #[test]
    fn update_keeps_existing_physical_id() {
        let tenant = FakeTenant::default();
        let (outcome, _) = run(event("Update", json!({})), &tenant, &StaticCredentials(None));

        assert_eq!(outcome.document.status, SignalStatus::Success);
        assert_eq!(outcome.document.physical_resource_id, "existing-physical-id");
        assert!(outcome.document.data.contains_key("UpdateTime"));
        assert!(!outcome.document.data.contains_key(PHYSICAL_RESOURCE_ID_KEY));
    }

    #[test]
    fn unrecognized_verb_fails_naming_the_verb() {
        let tenant = FakeTenant::default();
        let (outcome, sent) = run(event("Rollback", json!({})), &tenant, &credentials());

        assert_eq!(sent.len(), 1);
        assert_eq!(outcome.document.status, SignalStatus::Failed);
        assert_eq!(
            outcome.document.data["Error"],
            "Unknown request type: Rollback"
        );
        assert!(tenant.calls().is_empty());
    }

    #[test]
    fn requested_cleanup_deletes_categories_on_create() {
        let tenant = FakeTenant::with_categories(&["CUSTOM_01", "CUSTOM_02"]);
        let (outcome, _) = run(
            event("Create", json!({"NukeTenant": "True"})),
            &tenant,
            &credentials(),
        );

        assert_eq!(outcome.document.status, SignalStatus::Success);
        assert_eq!(outcome.document.data[CATEGORIES_DELETED_KEY], 2);
        assert_eq!(
            tenant.calls(),
            vec![
                "connect:acme",
                "list_users",
                "list_categories",
                "delete:CUSTOM_01",
                "delete:CUSTOM_02",
            ]
        );
    }

    #[test]
    fn requested_cleanup_without_credentials_fails_without_connecting() {
        let tenant = FakeTenant::with_categories(&["CUSTOM_01"]);
        let (outcome, _) = run(
            event("Create", json!({"NukeTenant": true})),
            &tenant,
            &StaticCredentials(None),
        );

        assert_eq!(outcome.document.status, SignalStatus::Failed);
        assert_eq!(
            outcome.document.reason,
            "tenant cleanup requested but no tenant credentials are configured"
        );
        assert!(tenant.calls().is_empty());
    }

    #[test]
    fn login_failure_becomes_failed_signal() {
        let tenant = FakeTenant {
            fail_login: true,
            ..FakeTenant::with_categories(&["CUSTOM_01"])
        };
        let (outcome, _) = run(
            event("Create", json!({"NukeTenant": "true"})),
            &tenant,
            &credentials(),
        );

        assert_eq!(outcome.document.status, SignalStatus::Failed);
        assert_eq!(
            outcome.document.data["Error"],
            "tenant login failed: authentication failed: invalid_client"
        );
        assert_eq!(tenant.calls(), vec!["connect:acme"]);
    }

    #[test]
    fn listing_failure_deletes_nothing_and_fails() {
        let tenant = FakeTenant {
            fail_listing: true,
            ..FakeTenant::with_categories(&["CUSTOM_01", "CUSTOM_02"])
        };
        let (outcome, sent) = run(
            event("Create", json!({"NukeTenant": true})),
            &tenant,
            &credentials(),
        );

        assert_eq!(sent.len(), 1);
        assert_eq!(outcome.document.status, SignalStatus::Failed);
        let message = outcome.document.data["Error"]
            .as_str()
            .expect("error is a string");
        assert!(
            message.starts_with("tenant cleanup failed: failed to list"),
            "{message}"
        );
        assert!(!tenant.calls().iter().any(|call| call.starts_with("delete:")));
    }

    #[test]
    fn failed_delete_stops_cleanup_and_names_the_category() {
        let tenant = FakeTenant {
            fail_delete_on: Some("CUSTOM_02".to_string()),
            ..FakeTenant::with_categories(&["CUSTOM_01", "CUSTOM_02", "CUSTOM_03"])
        };
        let (outcome, _) = run(
            event("Create", json!({"NukeTenant": "true"})),
            &tenant,
            &credentials(),
        );

        assert_eq!(outcome.document.status, SignalStatus::Failed);
        assert!(outcome.document.reason.contains("CUSTOM_02"));
        assert!(!outcome.document.data.contains_key(CATEGORIES_DELETED_KEY));
        assert_eq!(
            tenant.calls(),
            vec![
                "connect:acme",
                "list_users",
                "list_categories",
                "delete:CUSTOM_01",
                "delete:CUSTOM_02",
            ]
        );
    }

    #[test]
    fn malformed_nuke_flag_fails_the_create() {
        let tenant = FakeTenant::default();
        let (outcome, _) = run(
            event("Create", json!({"NukeTenant": "yes please"})),
            &tenant,
            &credentials(),
        );

        assert_eq!(outcome.document.status, SignalStatus::Failed);
        assert_eq!(
            outcome.document.data["Error"],
            "NukeTenant must be true or false, got yes please"
        );
    }

    #[test]
    fn expired_deadline_reports_out_of_time() {
        let tenant = FakeTenant::with_categories(&["CUSTOM_01"]);
        let signaler = RecordingSignaler::default();
        let credentials = credentials();
        let deps = Collaborators {
            connector: &tenant,
            credentials: &credentials,
            signaler: &signaler,
        };
        let context = InvocationContext {
            deadline: Some(Instant::now() + Duration::from_millis(100)),
            ..context()
        };

        let outcome = handle_cfn_event(
            event("Create", json!({"NukeTenant": "true"})),
            &context,
            &config("dev"),
            &deps,
        )
        .expect("request should decode");

        assert_eq!(outcome.document.status, SignalStatus::Failed);
        assert!(outcome.document.reason.contains("ran out of time"));
        assert!(!tenant.calls().iter().any(|call| call.starts_with("delete:")));
    }

    #[test]
    fn undelivered_signal_is_reported_not_raised() {
        let tenant = FakeTenant::default();
        let signaler = RecordingSignaler::failing();
        let deps = Collaborators {
            connector: &tenant,
            credentials: &StaticCredentials(None),
            signaler: &signaler,
        };

        let outcome = handle_cfn_event(
            event("Delete", json!({})),
            &context(),
            &config("dev"),
            &deps,
        )
        .expect("signal failure should not raise");

        assert!(!outcome.delivered);
        assert_eq!(outcome.document.status, SignalStatus::Success);
    }

    #[test]
    fn nuke_flag_parsing() {
        let request = |properties: Value| CfnRequest {
            resource_properties: properties.as_object().cloned().unwrap_or_default(),
            ..CfnRequest::default()
        };

        assert!(!nuke_requested(&request(json!({}))).expect("absent flag"));
        assert!(!nuke_requested(&request(json!({"NukeTenant": "false"}))).expect("false"));
        assert!(nuke_requested(&request(json!({"NukeTenant": " TRUE "}))).expect("true"));
        assert!(nuke_requested(&request(json!({"NukeTenant": true}))).expect("bool"));
        assert!(nuke_requested(&request(json!({"NukeTenant": 1}))).is_err());
    }
}
