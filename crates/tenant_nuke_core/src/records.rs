use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::contract::{json_kind, CfnRequest, EventError};

pub const DEFAULT_ENVIRONMENT: &str = "dev";
pub const PHYSICAL_RESOURCE_ID_KEY: &str = "PhysicalResourceId";
pub const CATEGORIES_DELETED_KEY: &str = "CategoriesDeleted";
pub const DIRECT_SUCCESS_MESSAGE: &str = "Lambda function executed successfully";

const UNKNOWN_EVENT_TYPE: &str = "unknown";

/// ISO-8601 without an offset, always with six fractional digits.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Trailing `/` segment of a stack identifier. Empty identifiers yield an
/// empty name.
pub fn stack_name_from_id(stack_id: &str) -> &str {
    stack_id.rsplit('/').next().unwrap_or(stack_id)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecordKind {
    #[serde(rename = "cloudformation_create")]
    Create,
    #[serde(rename = "cloudformation_update")]
    Update,
    #[serde(rename = "cloudformation_delete")]
    Delete,
}

impl RecordKind {
    fn message(self) -> &'static str {
        match self {
            Self::Create => "CloudFormation stack creation processed successfully",
            Self::Update => "CloudFormation stack update processed successfully",
            Self::Delete => "CloudFormation stack deletion processed successfully",
        }
    }

    fn time_key(self) -> &'static str {
        match self {
            Self::Create => "DeploymentTime",
            Self::Update => "UpdateTime",
            Self::Delete => "DeletionTime",
        }
    }
}

/// Metadata captured for one lifecycle request. Logged as-is; only a
/// projection of it is returned to CloudFormation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleRecord {
    #[serde(rename = "event_type")]
    pub kind: RecordKind,
    pub stack_name: String,
    pub environment: String,
    pub recorded_at: String,
    pub resource_properties: Map<String, Value>,
}

impl LifecycleRecord {
    pub fn new(
        kind: RecordKind,
        request: &CfnRequest,
        environment: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            stack_name: stack_name_from_id(&request.stack_id).to_string(),
            environment: environment.to_string(),
            recorded_at: iso_timestamp(now),
            resource_properties: request.resource_properties.clone(),
        }
    }

    pub fn response_data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("Message".to_string(), Value::from(self.kind.message()));
        data.insert("Environment".to_string(), Value::from(self.environment.clone()));
        data.insert("StackName".to_string(), Value::from(self.stack_name.clone()));
        data.insert(
            self.kind.time_key().to_string(),
            Value::from(self.recorded_at.clone()),
        );
        data
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectResult {
    pub event_type: Value,
    pub data_processed: bool,
}

/// Summarises a direct invocation. Payload processing is not implemented,
/// so `data_processed` is always false.
pub fn process_event(event: &Value) -> Result<DirectResult, EventError> {
    let object = event
        .as_object()
        .ok_or_else(|| EventError::NotAnObject(json_kind(event)))?;

    Ok(DirectResult {
        event_type: object
            .get("type")
            .cloned()
            .unwrap_or_else(|| Value::from(UNKNOWN_EVENT_TYPE)),
        data_processed: false,
    })
}
