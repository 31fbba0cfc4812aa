use std::sync::Arc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;
use crate::backend::{ExecuteResponse, FormBackend};
use crate::config::EngineConfig;
use crate::dependency::graph::find_cycle;
use crate::dependency::resolver::DependencyResolver;
use crate::error::{BackendError, SessionError};
use crate::form::controller::FormController;
use crate::schema::{DependencyMap, FormData};
use crate::store::ValueStore;
use crate::validation::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was sent; the form has errors.
    Invalid(Vec<ValidationError>),
    Executed(ExecuteResponse),
}

/// Editing session for one node's form: schema, values, dependency
/// refreshes and submission.
pub struct FormSession {
    id: Uuid,
    node_id: String,
    backend: Arc<dyn FormBackend>,
    store: Arc<dyn ValueStore>,
    controller: FormController,
    resolver: DependencyResolver,
    dependencies: DependencyMap,
    non_field_errors: Vec<String>,
}

impl FormSession {
    pub async fn open(
        backend: Arc<dyn FormBackend>,
        store: Arc<dyn ValueStore>,
        node_id: &str,
        config: &EngineConfig,
    ) -> Result<Self, SessionError> {
        let id = Uuid::new_v4();
        let schema = match backend.fetch_form_schema(node_id).await {
            Ok(schema) => schema,
            Err(BackendError::NotFound(_)) => {
                return Err(SessionError::NoForm {
                    node_id: node_id.to_string(),
                });
            }
            Err(e) => {
                warn!(session = %id, node_id = %node_id, error = %e, "Failed to load form");
                return Err(SessionError::LoadFailed(e));
            }
        };

        if let Some(cycle) = find_cycle(&schema.dependencies) {
            warn!(session = %id, node_id = %node_id, cycle = ?cycle, "Form dependencies contain a cycle");
        }

        let persisted = match store.load(node_id).await {
            Ok(values) => values.unwrap_or_default(),
            Err(e) => {
                warn!(session = %id, node_id = %node_id, error = %e, "Failed to load saved values");
                FormData::new()
            }
        };

        // Drop stale keys for fields the schema no longer declares
        let initial: FormData = persisted
            .into_iter()
            .filter(|(k, _)| schema.fields.iter().any(|f| &f.name == k))
            .collect();

        let controller = FormController::new(schema.fields, initial)
            .with_validate_on_change(config.validate_on_change);
        info!(session = %id, node_id = %node_id, fields = controller.fields().len(), "Form session opened");

        Ok(Self {
            id,
            node_id: node_id.to_string(),
            resolver: DependencyResolver::new(backend.clone(), node_id),
            backend,
            store,
            controller,
            dependencies: schema.dependencies,
            non_field_errors: schema.non_field_errors.unwrap_or_default(),
        })
    }

    pub async fn edit(&mut self, name: &str, value: Value) {
        self.controller.update_field(name, value.clone());
        if self.dependencies.contains_key(name) {
            self.resolver
                .on_field_change(&mut self.controller, name, &value, &self.dependencies)
                .await;
        }
    }

    pub async fn submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        if self.controller.is_submitting() {
            return Err(SessionError::AlreadySubmitting);
        }
        if !self.controller.validate_form() {
            return Ok(SubmitOutcome::Invalid(self.controller.errors().to_vec()));
        }

        self.controller.set_submitting(true);
        let result = self.backend.execute(&self.node_id, self.controller.data()).await;
        self.controller.set_submitting(false);

        let response = result.map_err(|e| {
            warn!(session = %self.id, node_id = %self.node_id, error = %e, "Execution request failed");
            SessionError::Execute(e)
        })?;

        if response.success {
            if let Err(e) = self.store.save(&self.node_id, self.controller.data()).await {
                warn!(session = %self.id, node_id = %self.node_id, error = %e, "Failed to persist form values");
            }
        } else {
            info!(
                session = %self.id,
                node_id = %self.node_id,
                error = ?response.error,
                error_type = ?response.error_type,
                "Node execution reported failure"
            );
        }
        Ok(SubmitOutcome::Executed(response))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn controller(&self) -> &FormController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut FormController {
        &mut self.controller
    }

    pub fn dependencies(&self) -> &DependencyMap {
        &self.dependencies
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}
