use async_trait::async_trait;
use anyhow::Result;
use redis::AsyncCommands;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;
use crate::schema::FormData;
use crate::store::ValueStore;

/// One Redis hash per node; each field value is stored as JSON text.
pub struct RedisValueStore {
    client: redis::Client,
}

impl RedisValueStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub fn open(url: &str) -> Result<Self> {
        Ok(Self::new(redis::Client::open(url)?))
    }

    fn values_key(&self, node_id: &str) -> String {
        format!("formflow:node:{}:values", node_id)
    }
}

#[async_trait]
impl ValueStore for RedisValueStore {
    async fn load(&self, node_id: &str) -> Result<Option<FormData>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw_map: HashMap<String, String> = conn.hgetall(self.values_key(node_id)).await?;
        if raw_map.is_empty() {
            return Ok(None);
        }

        let mut data = FormData::new();
        for (k, v_str) in raw_map {
            match serde_json::from_str::<Value>(&v_str) {
                Ok(v) => {
                    data.insert(k, v);
                }
                Err(e) => warn!(node_id = %node_id, field = %k, error = %e, "Skipping undecodable stored value"),
            }
        }
        Ok(Some(data))
    }

    async fn save(&self, node_id: &str, data: &FormData) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = self.values_key(node_id);

        let mut items = Vec::with_capacity(data.len());
        for (k, v) in data {
            items.push((k.clone(), serde_json::to_string(v)?));
        }

        // Replace rather than merge so removed fields do not linger
        let mut pipe = redis::pipe();
        pipe.atomic().del(&key);
        if !items.is_empty() {
            pipe.hset_multiple(&key, &items);
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn clear(&self, node_id: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.values_key(node_id)).await?;
        Ok(())
    }
}
