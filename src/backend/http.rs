use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use crate::backend::dedup::RequestDeduplicator;
use crate::backend::{
    DependentOptionsRequest, ExecuteRequest, ExecuteResponse, ExecutionStatus, FormBackend, OptionItem,
    OptionsResponse,
};
use crate::config::EngineConfig;
use crate::error::BackendError;
use crate::schema::{FormData, FormSchema};

/// [`FormBackend`] over the REST API.
pub struct HttpFormBackend {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
    schema_requests: RequestDeduplicator<Result<FormSchema, BackendError>>,
}

impl HttpFormBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_timeout(base_url, Duration::from_secs(30), None)
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, BackendError> {
        Self::with_timeout(
            &config.backend_url,
            Duration::from_secs(config.request_timeout_secs),
            config.auth_token.clone(),
        )
    }

    pub fn with_timeout(base_url: &str, timeout: Duration, auth_token: Option<String>) -> Result<Self, BackendError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| BackendError::Transport(format!("Invalid backend URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::Transport(format!("Invalid backend URL '{}'", base_url)));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parsed,
            auth_token,
            schema_requests: RequestDeduplicator::new(),
        })
    }

    /// Appends `segments` to the base path, percent-encoding each one so an
    /// id cannot change the route.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, resource: &str) -> Result<T, BackendError> {
        let response = self.authorize(builder).send().await?;
        decode(response, resource).await
    }

    async fn load_schema(&self, node_id: &str) -> Result<FormSchema, BackendError> {
        let url = self.url(&["nodes", node_id, "form"]);
        debug!(url = %url, "Fetching form schema");
        self.send(self.client.get(url), node_id).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response, resource: &str) -> Result<T, BackendError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound(resource.to_string()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl FormBackend for HttpFormBackend {
    async fn fetch_form_schema(&self, node_id: &str) -> Result<FormSchema, BackendError> {
        let key = format!("schema:{}", node_id);
        self.schema_requests
            .run(&key, || self.load_schema(node_id))
            .await
    }

    async fn fetch_dependent_options(
        &self,
        node_id: &str,
        request: &DependentOptionsRequest,
    ) -> Result<Vec<OptionItem>, BackendError> {
        let url = self.url(&["nodes", node_id, "form", "options"]);
        debug!(url = %url, dependent = %request.dependent_field, "Fetching dependent options");
        let response: OptionsResponse = self
            .send(self.client.post(url).json(request), &request.dependent_field)
            .await?;
        Ok(response.options)
    }

    async fn execute(&self, node_id: &str, form_data: &FormData) -> Result<ExecuteResponse, BackendError> {
        let url = self.url(&["nodes", node_id, "execute"]);
        debug!(url = %url, "Executing node");
        self.send(self.client.post(url).json(&ExecuteRequest { form_data }), node_id)
            .await
    }

    async fn execution_status(&self, execution_id: &str) -> Result<ExecutionStatus, BackendError> {
        let url = self.url(&["executions", execution_id]);
        self.send(self.client.get(url), execution_id).await
    }
}
