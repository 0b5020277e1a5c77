use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Settings for the remote Gemini recognizer.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub memory_capacity: Option<u64>,
    pub max_image_bytes: usize,
    /// `None` when no API key is configured; recognition then runs local-only.
    pub remote: Option<RemoteConfig>,
    pub allowed_origins: Vec<String>,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_CACHE_DIR: &str = "./data/recognition-cache";
    const DEFAULT_CACHE_TTL_HOURS: u64 = 24;
    const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;
    const DEFAULT_MODEL: &str = "gemini-pro-vision";
    const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_MAX_RETRIES: u32 = 3;

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str, default: u64| -> u64 {
            match lookup(key) {
                Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                    warn!("{} has invalid value '{}', using {}", key, raw, default);
                    default
                }),
                None => default,
            }
        };

        let remote = match lookup("GEMINI_API_KEY") {
            Some(key) if !key.trim().is_empty() => Some(RemoteConfig {
                api_key: key.trim().to_string(),
                model: lookup("GEMINI_MODEL").unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
                endpoint: lookup("GEMINI_ENDPOINT")
                    .unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_string()),
                timeout: Duration::from_secs(parsed(
                    "GEMINI_TIMEOUT_SECS",
                    Self::DEFAULT_TIMEOUT_SECS,
                )),
                max_retries: u32::try_from(parsed(
                    "GEMINI_MAX_RETRIES",
                    Self::DEFAULT_MAX_RETRIES as u64,
                ))
                .unwrap_or_else(|_| {
                    warn!("GEMINI_MAX_RETRIES out of range, using {}", Self::DEFAULT_MAX_RETRIES);
                    Self::DEFAULT_MAX_RETRIES
                }),
            }),
            _ => {
                warn!("GEMINI_API_KEY not set, vehicle recognition will use the local fallback only");
                None
            }
        };

        let http_port = u16::try_from(parsed("VISION_HTTP_PORT", Self::DEFAULT_HTTP_PORT as u64))
            .unwrap_or_else(|_| {
                warn!("VISION_HTTP_PORT out of range, using {}", Self::DEFAULT_HTTP_PORT);
                Self::DEFAULT_HTTP_PORT
            });

        let max_image_bytes = usize::try_from(parsed(
            "VISION_MAX_IMAGE_BYTES",
            Self::DEFAULT_MAX_IMAGE_BYTES as u64,
        ))
        .unwrap_or_else(|_| {
            warn!("VISION_MAX_IMAGE_BYTES out of range, using {}", Self::DEFAULT_MAX_IMAGE_BYTES);
            Self::DEFAULT_MAX_IMAGE_BYTES
        });

        Self {
            host: lookup("VISION_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port,
            cache_dir: lookup("VISION_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CACHE_DIR)),
            cache_ttl: Duration::from_secs(
                parsed("VISION_CACHE_TTL_HOURS", Self::DEFAULT_CACHE_TTL_HOURS).saturating_mul(3600),
            ),
            memory_capacity: lookup("VISION_MEMORY_CAPACITY")
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .filter(|capacity| *capacity > 0),
            max_image_bytes,
            remote,
            allowed_origins: lookup("VISION_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
        }
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.memory_capacity, None);
        assert!(config.remote.is_none());
        assert_eq!(config.allowed_origins, vec!["*".to_string()]);
    }

    #[test]
    fn test_blank_api_key_means_local_only() {
        let config = config_from(&[("GEMINI_API_KEY", "   ")]);
        assert!(!config.remote_enabled());
    }

    #[test]
    fn test_remote_settings_are_read() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_TIMEOUT_SECS", "5"),
            ("GEMINI_MAX_RETRIES", "1"),
            ("VISION_CACHE_TTL_HOURS", "2"),
            ("VISION_MEMORY_CAPACITY", "500"),
        ]);

        let remote = config.remote.expect("remote should be enabled");
        assert_eq!(remote.api_key, "secret");
        assert_eq!(remote.model, "gemini-pro-vision");
        assert_eq!(remote.timeout, Duration::from_secs(5));
        assert_eq!(remote.max_retries, 1);
        assert_eq!(config.cache_ttl, Duration::from_secs(7200));
        assert_eq!(config.memory_capacity, Some(500));
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("VISION_HTTP_PORT", "99999"),
            ("VISION_CACHE_TTL_HOURS", "soon"),
        ]);

        assert_eq!(config.http_port, 8080);
        assert_eq!(config.cache_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_out_of_range_numbers_do_not_wrap() {
        let huge = u64::MAX.to_string();
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MAX_RETRIES", "4294967296"),
            ("VISION_CACHE_TTL_HOURS", huge.as_str()),
            ("VISION_MAX_IMAGE_BYTES", "1048576"),
        ]);

        assert_eq!(config.cache_ttl, Duration::from_secs(u64::MAX));
        assert_eq!(config.max_image_bytes, 1024 * 1024);
        assert_eq!(config.remote.expect("remote should be enabled").max_retries, 3);
    }
}
