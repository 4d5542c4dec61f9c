use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use memory_types::MemoryError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// One of "xai", "google", "anthropic". Selected at startup; the
    /// Extractor only ever sees the `ChatCapability` this resolves to.
    pub chat_provider: String,
    pub chat_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chat_provider: "xai".to_string(),
            chat_model: "grok-4-fast".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    pub provider: String,
    pub model: String,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            provider: "voyage".to_string(),
            model: "voyage-3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemoryServiceConfig {
    pub chat: ProviderConfig,
    pub embed: EmbedConfig,
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
}

impl MemoryServiceConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(dir) = env::var("MEMORY_DATA_DIR") {
            if !dir.is_empty() {
                config.store.data_dir = dir;
            }
        }
        if let Ok(provider) = env::var("MEMORY_CHAT_PROVIDER") {
            if !provider.is_empty() {
                config.chat.chat_provider = provider;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    /// Env var names expected to hold API credentials for the currently
    /// configured chat provider and the embedder.
    fn required_env_vars(&self) -> Vec<&'static str> {
        let mut vars = match self.chat.chat_provider.as_str() {
            "google" => vec!["GOOGLE_API_KEY"],
            "anthropic" => vec!["ANTHROPIC_API_KEY"],
            _ => vec!["XAI_API_KEY"],
        };
        vars.push("VOYAGE_API_KEY");
        vars
    }

    /// Startup credential check. Returns `Unconfigured` naming every missing
    /// variable (never the values of any that are present) if any are
    /// absent or empty.
    pub fn validate_credentials(&self) -> Result<(), MemoryError> {
        let missing: Vec<&str> = self
            .required_env_vars()
            .into_iter()
            .filter(|name| env::var(name).map(|v| v.is_empty()).unwrap_or(true))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MemoryError::Unconfigured(missing.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = MemoryServiceConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: MemoryServiceConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.chat.chat_provider, config.chat.chat_provider);
        assert_eq!(parsed.store.data_dir, config.store.data_dir);
    }

    #[test]
    fn missing_path_falls_back_to_defaults() {
        let config = MemoryServiceConfig::load_from("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.chat.chat_provider, "xai");
    }
}
