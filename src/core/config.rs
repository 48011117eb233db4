use crate::core::currency::default_symbols;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const ENV_PRICE_API_URL: &str = "GOLDTICK_PRICE_API_URL";
pub const ENV_PRICE_API_TOKEN: &str = "GOLDTICK_PRICE_API_TOKEN";
pub const ENV_FX_API_URL: &str = "GOLDTICK_FX_API_URL";
pub const ENV_CURRENCY: &str = "GOLDTICK_CURRENCY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GoldApiProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for GoldApiProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.goldapi.io/api".to_string(),
            access_token: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FxProviderConfig {
    pub base_url: String,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
}

impl Default for FxProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.exchangerate.host".to_string(),
            symbols: default_symbols(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub goldapi: GoldApiProviderConfig,
    #[serde(default)]
    pub fx: FxProviderConfig,
}

/// Timing knobs for the polling loop, all in milliseconds.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub cadence_ms: u64,
    pub request_timeout_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    /// Minimum spacing between exchange-rate refreshes.
    pub fx_refresh_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            cadence_ms: 500,
            request_timeout_ms: 5000,
            backoff_base_ms: 1000,
            backoff_cap_ms: 30_000,
            fx_refresh_ms: 60_000,
        }
    }
}

impl PollingConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn fx_refresh(&self) -> Duration {
        Duration::from_millis(self.fx_refresh_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            providers: ProvidersConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file if present, otherwise starts from
    /// defaults. Environment overrides are applied either way.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "goldtick", "goldtick")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::from_file(path)?.with_env_overrides())
    }

    /// Reads a config file as written, without environment overrides.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies process environment (and `.env`) on top of the file values.
    pub fn with_env_overrides(self) -> Self {
        dotenvy::dotenv().ok();
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_PRICE_API_URL) {
            self.providers.goldapi.base_url = url;
        }
        if let Some(token) = lookup(ENV_PRICE_API_TOKEN) {
            debug!("Using price API token from {}", ENV_PRICE_API_TOKEN);
            self.providers.goldapi.access_token = Some(token);
        }
        if let Some(url) = lookup(ENV_FX_API_URL) {
            self.providers.fx.base_url = url;
        }
        if let Some(currency) = lookup(ENV_CURRENCY) {
            self.currency = currency.to_uppercase();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currency: "INR"
providers:
  goldapi:
    base_url: "http://example.com/gold"
    access_token: "secret"
  fx:
    base_url: "http://example.com/fx"
    symbols: [USD, INR]
polling:
  cadence_ms: 1000
  backoff_cap_ms: 60000
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.currency, "INR");
        assert_eq!(config.providers.goldapi.base_url, "http://example.com/gold");
        assert_eq!(
            config.providers.goldapi.access_token.as_deref(),
            Some("secret")
        );
        assert_eq!(config.providers.fx.symbols, vec!["USD", "INR"]);
        assert_eq!(config.polling.cadence(), Duration::from_millis(1000));
        assert_eq!(config.polling.backoff_cap(), Duration::from_secs(60));
        // untouched keys keep their defaults
        assert_eq!(config.polling.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.polling.backoff_base(), Duration::from_secs(1));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.currency, "USD");
        assert!(config.providers.goldapi.access_token.is_none());
        assert_eq!(config.providers.fx.symbols.len(), 10);
        assert_eq!(config.polling.cadence_ms, 500);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let env = HashMap::from([
            (ENV_PRICE_API_TOKEN, "from-env"),
            (ENV_PRICE_API_URL, "http://override/gold"),
            (ENV_CURRENCY, "eur"),
            (ENV_FX_API_URL, "  "),
        ]);
        let config = AppConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.providers.goldapi.access_token.as_deref(),
            Some("from-env")
        );
        assert_eq!(config.providers.goldapi.base_url, "http://override/gold");
        assert_eq!(config.currency, "EUR");
        assert_eq!(
            config.providers.fx.base_url,
            "https://api.exchangerate.host"
        );
    }

    #[test]
    fn test_from_file_ignores_environment() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "currency: \"aed\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.currency, "aed");
        assert_eq!(config.providers.goldapi, GoldApiProviderConfig::default());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let err = AppConfig::load_from_path("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
