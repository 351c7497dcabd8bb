//! Configuration management for the docsight service

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::document::MAX_FILE_SIZE;
use crate::ocr::{
    RetryPolicy, DEFAULT_MISTRAL_MODEL, DEFAULT_MISTRAL_URL, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY,
};
use crate::processor::DEFAULT_MAX_CONCURRENT;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_file_size: u64,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub max_concurrent: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: None,
            api_url: DEFAULT_MISTRAL_URL.to_string(),
            model: DEFAULT_MISTRAL_MODEL.to_string(),
        }
    }
}

// Keeps the key out of logs and panic messages.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            cache_dir: PathBuf::from("ocr_cache"),
            output_dir: PathBuf::from("output"),
            max_file_size: MAX_FILE_SIZE,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl ProcessingConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay)
    }
}

/// Parse a numeric variable, falling back to `default` when unset or invalid
fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_or(&lookup, "SERVER_PORT", defaults.server.port),
            },
            provider: ProviderConfig {
                api_key: lookup("MISTRAL_API_KEY").filter(|key| !key.trim().is_empty()),
                api_url: lookup("MISTRAL_API_URL").unwrap_or(defaults.provider.api_url),
                model: lookup("MISTRAL_MODEL").unwrap_or(defaults.provider.model),
            },
            processing: ProcessingConfig {
                cache_dir: lookup("OCR_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.processing.cache_dir),
                output_dir: lookup("OCR_OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.processing.output_dir),
                max_file_size: parse_or(
                    &lookup,
                    "OCR_MAX_FILE_SIZE",
                    defaults.processing.max_file_size,
                ),
                retry_attempts: parse_or(
                    &lookup,
                    "OCR_RETRY_ATTEMPTS",
                    defaults.processing.retry_attempts,
                ),
                retry_delay: Duration::from_secs(parse_or(
                    &lookup,
                    "OCR_RETRY_DELAY_SECS",
                    defaults.processing.retry_delay.as_secs(),
                )),
                max_concurrent: parse_or(
                    &lookup,
                    "OCR_MAX_CONCURRENT",
                    defaults.processing.max_concurrent,
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.provider.model, "mistral-ocr-latest");
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.processing.cache_dir, PathBuf::from("ocr_cache"));
        assert_eq!(config.processing.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.processing.retry_attempts, 3);
        assert_eq!(config.processing.retry_delay, Duration::from_secs(2));
        assert_eq!(config.processing.max_concurrent, 3);
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let config = config_from(&[
            ("SERVER_PORT", "9100"),
            ("OCR_CACHE_DIR", "/var/cache/ocr"),
            ("OCR_RETRY_ATTEMPTS", "five"),
            ("OCR_MAX_CONCURRENT", "8"),
            ("MISTRAL_API_KEY", "   "),
        ]);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.processing.cache_dir, PathBuf::from("/var/cache/ocr"));
        assert_eq!(config.processing.retry_attempts, 3);
        assert_eq!(config.processing.max_concurrent, 8);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = config_from(&[("MISTRAL_API_KEY", "sk-very-secret")]);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
