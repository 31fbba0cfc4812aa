use std::collections::HashMap;
use std::sync::Arc;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};
use crate::backend::{DependentOptionsRequest, FormBackend, OptionItem};
use crate::dependency::graph::{direct_dependents, transitive_dependents};
use crate::error::BackendError;
use crate::form::controller::FormController;
use crate::schema::DependencyMap;

/// An option request issued for one dependent field.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub field: String,
    /// Latest-wins tag; only the highest sequence issued for a field applies.
    pub sequence: u64,
    pub request: DependentOptionsRequest,
}

/// Refreshes dependent fields when a parent value changes.
///
/// All transitive dependents are cleared right away. Only direct dependents
/// get new options; deeper levels refresh when their own parent is edited.
pub struct DependencyResolver {
    backend: Arc<dyn FormBackend>,
    node_id: String,
    sequences: HashMap<String, u64>,
}

impl DependencyResolver {
    pub fn new(backend: Arc<dyn FormBackend>, node_id: &str) -> Self {
        Self {
            backend,
            node_id: node_id.to_string(),
            sequences: HashMap::new(),
        }
    }

    /// Clears dependents and marks the direct ones loading. The returned
    /// requests must be answered through [`complete_request`](Self::complete_request).
    pub fn begin_change(
        &mut self,
        form: &mut FormController,
        changed_field: &str,
        new_value: &Value,
        dependencies: &DependencyMap,
    ) -> Vec<PendingRequest> {
        let (dependents, unknown): (Vec<_>, Vec<_>) = transitive_dependents(changed_field, dependencies)
            .into_iter()
            .partition(|name| form.field(name).is_some());
        for name in &unknown {
            warn!(parent = %changed_field, dependent = %name, "Dependency names an unknown field");
        }
        if dependents.is_empty() {
            return Vec::new();
        }
        debug!(field = %changed_field, dependents = ?dependents, "Clearing dependent fields");
        form.clear_fields(&dependents);

        let mut pending = Vec::new();
        for dependent in direct_dependents(changed_field, dependencies) {
            if form.field(&dependent).is_none() {
                continue;
            }
            let sequence = self.next_sequence(&dependent);
            form.set_loading(&dependent, true);
            pending.push(PendingRequest {
                field: dependent.clone(),
                sequence,
                request: DependentOptionsRequest {
                    parent_field: changed_field.to_string(),
                    parent_value: new_value.clone(),
                    dependent_field: dependent,
                    form_values: form.data().clone(),
                },
            });
        }
        pending
    }

    /// Applies one option response. Returns true when new choices were
    /// installed; stale and failed responses return false.
    pub fn complete_request(
        &mut self,
        form: &mut FormController,
        field: &str,
        sequence: u64,
        result: Result<Vec<OptionItem>, BackendError>,
    ) -> bool {
        if !self.is_latest(field, sequence) {
            debug!(field = %field, sequence, "Discarding stale option response");
            return false;
        }
        form.set_loading(field, false);

        match result {
            Ok(options) => {
                let choices = options.into_iter().map(Into::into).collect();
                form.replace_choices(field, choices);
                form.clear_fields(&[field.to_string()]);
                true
            }
            Err(e) => {
                warn!(field = %field, error = %e, "Failed to load dependent options");
                false
            }
        }
    }

    /// Runs a full change pass: clear, fetch the direct dependents'
    /// options concurrently, and apply each response as it arrives.
    pub async fn on_field_change(
        &mut self,
        form: &mut FormController,
        changed_field: &str,
        new_value: &Value,
        dependencies: &DependencyMap,
    ) {
        let pending = self.begin_change(form, changed_field, new_value, dependencies);
        if pending.is_empty() {
            return;
        }

        let mut requests = JoinSet::new();
        for p in &pending {
            let backend = self.backend.clone();
            let node_id = self.node_id.clone();
            let field = p.field.clone();
            let sequence = p.sequence;
            let request = p.request.clone();
            requests.spawn(async move {
                let result = backend.fetch_dependent_options(&node_id, &request).await;
                (field, sequence, result)
            });
        }

        while let Some(joined) = requests.join_next().await {
            match joined {
                Ok((field, sequence, result)) => {
                    self.complete_request(form, &field, sequence, result);
                }
                Err(e) => error!(error = %e, "Option request task failed"),
            }
        }

        // A task that died never reported back; release its loading flag
        for p in pending {
            if form.is_loading(&p.field) && self.is_latest(&p.field, p.sequence) {
                form.set_loading(&p.field, false);
            }
        }
    }

    pub fn latest_sequence(&self, field: &str) -> Option<u64> {
        self.sequences.get(field).copied()
    }

    fn is_latest(&self, field: &str, sequence: u64) -> bool {
        self.sequences.get(field) == Some(&sequence)
    }

    fn next_sequence(&mut self, field: &str) -> u64 {
        let seq = self.sequences.entry(field.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }
}
