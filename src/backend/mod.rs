use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use crate::error::BackendError;
use crate::schema::{Choice, FormData, FormSchema};

pub mod dedup;
pub mod http;
pub mod poll;

/// Body of a dependent-options request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependentOptionsRequest {
    pub parent_field: String,
    pub parent_value: Value,
    pub dependent_field: String,
    pub form_values: FormData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionItem {
    pub value: Value,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

impl From<OptionItem> for Choice {
    fn from(item: OptionItem) -> Self {
        Choice {
            value: item.value,
            text: item.text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsResponse {
    pub options: Vec<OptionItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest<'a> {
    pub form_data: &'a FormData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Present when the backend runs the node asynchronously.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Failed | ExecutionState::Cancelled
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionStatus {
    pub status: ExecutionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The REST endpoints the form engine talks to.
#[async_trait]
pub trait FormBackend: Send + Sync {
    async fn fetch_form_schema(&self, node_id: &str) -> Result<FormSchema, BackendError>;

    async fn fetch_dependent_options(
        &self,
        node_id: &str,
        request: &DependentOptionsRequest,
    ) -> Result<Vec<OptionItem>, BackendError>;

    async fn execute(&self, node_id: &str, form_data: &FormData) -> Result<ExecuteResponse, BackendError>;

    async fn execution_status(&self, execution_id: &str) -> Result<ExecutionStatus, BackendError>;
}
