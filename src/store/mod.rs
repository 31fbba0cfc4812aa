use async_trait::async_trait;
use anyhow::{Result, Context as AnyhowContext};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;
use crate::config::EngineConfig;
use crate::schema::FormData;
use crate::store::redis_store::RedisValueStore;

pub mod redis_store;

/// Persists form values across sessions, keyed by node identifier.
#[async_trait]
pub trait ValueStore: Send + Sync {
    async fn load(&self, node_id: &str) -> Result<Option<FormData>>;
    async fn save(&self, node_id: &str, data: &FormData) -> Result<()>;
    async fn clear(&self, node_id: &str) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryValueStore {
    values: DashMap<String, FormData>,
}

impl InMemoryValueStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }
}

#[async_trait]
impl ValueStore for InMemoryValueStore {
    async fn load(&self, node_id: &str) -> Result<Option<FormData>> {
        Ok(self.values.get(node_id).map(|v| v.value().clone()))
    }

    async fn save(&self, node_id: &str, data: &FormData) -> Result<()> {
        self.values.insert(node_id.to_string(), data.clone());
        Ok(())
    }

    async fn clear(&self, node_id: &str) -> Result<()> {
        self.values.remove(node_id);
        Ok(())
    }
}

/// Redis when `redis_url` is configured, otherwise an in-process store.
pub fn value_store_from_config(config: &EngineConfig) -> Result<Arc<dyn ValueStore>> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisValueStore::open(url)
                .with_context(|| format!("Failed to open value store at {}", url))?;
            info!(redis_url = %url, "Using Redis value store");
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(InMemoryValueStore::new())),
    }
}
