use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const REQUEST_TYPE_FIELD: &str = "RequestType";
pub const ERROR_DATA_KEY: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleVerb {
    Create,
    Update,
    Delete,
    Unrecognized(String),
}

impl LifecycleVerb {
    pub fn parse(value: &str) -> Self {
        match value {
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Delete" => Self::Delete,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Reads the verb from the raw `RequestType` value. Non-string values are
    /// kept in their JSON text form so failure messages can still name them.
    pub fn from_field(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::parse(text),
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Unrecognized(value) => value,
        }
    }
}

impl std::fmt::Display for LifecycleVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    CloudFormation(Value),
    Direct(Value),
}

pub fn is_cloudformation_event(event: &Value) -> bool {
    event
        .as_object()
        .map(|object| object.contains_key(REQUEST_TYPE_FIELD))
        .unwrap_or(false)
}

pub fn classify(event: Value) -> Invocation {
    if is_cloudformation_event(&event) {
        Invocation::CloudFormation(event)
    } else {
        Invocation::Direct(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("event payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRequest {
    pub request_type: Value,
    #[serde(rename = "ResponseURL", default)]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<Map<String, Value>>,
}

impl CfnRequest {
    pub fn from_event(event: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(event)
    }

    /// Reads only the fields needed to address a response, skipping any that
    /// are missing or not strings. Used when the full request will not decode.
    pub fn addressing_from(event: &Value) -> Self {
        let text = |field: &str| {
            event
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            request_type: event.get(REQUEST_TYPE_FIELD).cloned().unwrap_or_default(),
            response_url: text("ResponseURL"),
            stack_id: text("StackId"),
            request_id: text("RequestId"),
            logical_resource_id: text("LogicalResourceId"),
            physical_resource_id: event
                .get("PhysicalResourceId")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Self::default()
        }
    }

    pub fn verb(&self) -> LifecycleVerb {
        LifecycleVerb::from_field(&self.request_type)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Success,
    Failed,
}

/// Outcome of one lifecycle request, before it is addressed to a stack.
#[derive(Debug, Clone, PartialEq)]
pub struct CfnSignal {
    pub status: SignalStatus,
    pub data: Map<String, Value>,
    pub physical_resource_id: Option<String>,
    pub reason: Option<String>,
}

impl CfnSignal {
    pub fn success(data: Map<String, Value>, physical_resource_id: Option<String>) -> Self {
        Self {
            status: SignalStatus::Success,
            data,
            physical_resource_id,
            reason: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut data = Map::new();
        data.insert(ERROR_DATA_KEY.to_string(), Value::String(message.clone()));
        Self {
            status: SignalStatus::Failed,
            data,
            physical_resource_id: None,
            reason: Some(message),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseDocument {
    pub status: SignalStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: Map<String, Value>,
}

pub fn build_response_document(
    request: &CfnRequest,
    signal: &CfnSignal,
    log_stream_name: &str,
) -> ResponseDocument {
    let physical_resource_id = signal
        .physical_resource_id
        .clone()
        .or_else(|| request.physical_resource_id.clone())
        .unwrap_or_else(|| log_stream_name.to_string());
    let reason = signal.reason.clone().unwrap_or_else(|| {
        format!("See the details in CloudWatch Log Stream: {log_stream_name}")
    });

    ResponseDocument {
        status: signal.status,
        reason,
        physical_resource_id,
        stack_id: request.stack_id.clone(),
        request_id: request.request_id.clone(),
        logical_resource_id: request.logical_resource_id.clone(),
        no_echo: false,
        data: signal.data.clone(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}
