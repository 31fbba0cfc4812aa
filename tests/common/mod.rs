#![allow(dead_code)]

use async_trait::async_trait;
use formflow::backend::{
    DependentOptionsRequest, ExecuteResponse, ExecutionState, ExecutionStatus, FormBackend, OptionItem,
};
use formflow::error::BackendError;
use formflow::schema::{FormData, FormSchema};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-process backend with canned responses and a request log.
#[derive(Default)]
pub struct FakeBackend {
    pub schema: Mutex<Option<Result<FormSchema, BackendError>>>,
    /// dependent field -> options returned for it
    pub options: Mutex<HashMap<String, Vec<OptionItem>>>,
    /// dependent fields whose option request fails
    pub failing: Mutex<Vec<String>>,
    pub option_delay: Option<Duration>,
    pub option_requests: Mutex<Vec<DependentOptionsRequest>>,
    pub executed: Mutex<Vec<FormData>>,
    pub execute_response: Mutex<Option<Result<ExecuteResponse, BackendError>>>,
    pub statuses: Mutex<VecDeque<Result<ExecutionState, BackendError>>>,
    pub status_calls: AtomicUsize,
    pub schema_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: FormSchema) -> Self {
        let backend = Self::new();
        *backend.schema.lock().unwrap() = Some(Ok(schema));
        backend
    }

    pub fn set_options(&self, field: &str, values: &[&str]) {
        let items = values
            .iter()
            .map(|v| OptionItem {
                value: json!(v),
                text: v.to_string(),
                selected: None,
            })
            .collect();
        self.options.lock().unwrap().insert(field.to_string(), items);
    }

    pub fn fail_options_for(&self, field: &str) {
        self.failing.lock().unwrap().push(field.to_string());
    }

    pub fn requested_fields(&self) -> Vec<String> {
        self.option_requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.dependent_field.clone())
            .collect()
    }

    pub fn push_statuses(&self, states: &[ExecutionState]) {
        self.statuses.lock().unwrap().extend(states.iter().copied().map(Ok));
    }

    pub fn push_status_error(&self, err: BackendError) {
        self.statuses.lock().unwrap().push_back(Err(err));
    }
}

#[async_trait]
impl FormBackend for FakeBackend {
    async fn fetch_form_schema(&self, node_id: &str) -> Result<FormSchema, BackendError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.schema
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(BackendError::NotFound(node_id.to_string())))
    }

    async fn fetch_dependent_options(
        &self,
        _node_id: &str,
        request: &DependentOptionsRequest,
    ) -> Result<Vec<OptionItem>, BackendError> {
        self.option_requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.option_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&request.dependent_field) {
            return Err(BackendError::Transport("connection reset".to_string()));
        }
        Ok(self
            .options
            .lock()
            .unwrap()
            .get(&request.dependent_field)
            .cloned()
            .unwrap_or_default())
    }

    async fn execute(&self, _node_id: &str, form_data: &FormData) -> Result<ExecuteResponse, BackendError> {
        self.executed.lock().unwrap().push(form_data.clone());
        self.execute_response.lock().unwrap().clone().unwrap_or_else(|| {
            Ok(ExecuteResponse {
                success: true,
                output: Some(Value::String("ok".to_string())),
                error: None,
                error_type: None,
                execution_id: None,
            })
        })
    }

    async fn execution_status(&self, _execution_id: &str) -> Result<ExecutionStatus, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let state = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ExecutionState::Running))?;
        Ok(ExecutionStatus {
            status: state,
            output: None,
            error: None,
        })
    }
}
