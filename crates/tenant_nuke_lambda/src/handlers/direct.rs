use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tenant_nuke_core::contract::{ApiGatewayResponse, EventError};
use tenant_nuke_core::records::{iso_timestamp, process_event, DIRECT_SUCCESS_MESSAGE};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum DirectError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub fn handle_direct_invocation(
    event: &Value,
    environment: &str,
    now: DateTime<Utc>,
) -> ApiGatewayResponse {
    let timestamp = iso_timestamp(now);
    match success_body(event, environment, &timestamp) {
        Ok(body) => response(200, body),
        Err(err) => {
            error!(
                component = "direct_handler",
                event = "invocation_failed",
                error = %err,
                "Error in direct invocation"
            );
            response(
                500,
                json!({
                    "error": err.to_string(),
                    "environment": environment,
                    "timestamp": timestamp,
                })
                .to_string(),
            )
        }
    }
}

fn success_body(event: &Value, environment: &str, timestamp: &str) -> Result<String, DirectError> {
    let result = process_event(event)?;
    Ok(serde_json::to_string(&json!({
        "message": DIRECT_SUCCESS_MESSAGE,
        "environment": environment,
        "timestamp": timestamp,
        "result": result,
    }))?)
}

fn response(status_code: u16, body: String) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({
            "Content-Type": "application/json",
            "Access-Control-Allow-Origin": "*",
        }),
        body,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0)
            .single()
            .expect("valid timestamp")
    }

    fn body(response: &ApiGatewayResponse) -> Value {
        serde_json::from_str(&response.body).expect("body should be JSON")
    }

    #[test]
    fn well_formed_event_returns_200_without_processing() {
        let response = handle_direct_invocation(&json!({"type": "report"}), "dev", now());

        assert_eq!(response.status_code, 200);
        let body = body(&response);
        assert_eq!(body["message"], "Lambda function executed successfully");
        assert_eq!(body["environment"], "dev");
        assert_eq!(body["timestamp"], "2026-10-19T09:15:00.000000");
        assert_eq!(body["result"]["event_type"], "report");
        assert_eq!(body["result"]["data_processed"], false);
    }

    #[test]
    fn internal_error_returns_500_with_error_text() {
        let response = handle_direct_invocation(&json!("not an object"), "prod", now());

        assert_eq!(response.status_code, 500);
        let body = body(&response);
        assert_eq!(
            body["error"],
            "event payload must be a JSON object, got string"
        );
        assert_eq!(body["environment"], "prod");
        assert!(body.get("result").is_none());
    }

    #[test]
    fn both_outcomes_allow_any_origin() {
        for event in [json!({}), json!(null)] {
            let response = handle_direct_invocation(&event, "dev", now());
            assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
            assert_eq!(response.headers["Content-Type"], "application/json");
        }
    }

    #[test]
    fn response_serializes_status_code_in_camel_case() {
        let response = handle_direct_invocation(&json!({}), "dev", now());
        let value = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(value["statusCode"], 200);
        assert!(value["body"].is_string());
    }
}
