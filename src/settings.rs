use serde::{Deserialize, Serialize};

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_history_limit() -> usize {
    50
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Base URL of the classifier service.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Maximum number of entries kept in the prediction history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            debug_logging: false,
            history_limit: default_history_limit(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
