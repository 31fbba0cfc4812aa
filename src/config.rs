use anyhow::{Result, Context as AnyhowContext};
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    /// Interval between execution status checks
    pub poll_interval_ms: u64,
    pub validate_on_change: bool,
    pub redis_url: Option<String>,
    pub auth_token: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout_secs: 30,
            poll_interval_ms: 2000,
            validate_on_change: true,
            redis_url: None,
            auth_token: None,
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

pub fn load_config_from_yaml(file_path: &Path) -> Result<EngineConfig> {
    let yaml_content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read config file from {}", file_path.display()))?;

    let config: EngineConfig = serde_yaml::from_str(&yaml_content)
        .with_context(|| format!("Failed to deserialize config from {}", file_path.display()))?;

    Ok(config)
}
