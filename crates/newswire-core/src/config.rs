//! Service configuration assembled from environment variables.
//!
//! | Variable | Fallback | Default |
//! |----------|----------|---------|
//! | `NEWSWIRE_WORDPRESS_URL` | `WORDPRESS_API_URL` | unset |
//! | `NEWSWIRE_SUPABASE_URL` | `SUPABASE_URL` | unset |
//! | `NEWSWIRE_SUPABASE_ANON_KEY` | `SUPABASE_ANON_KEY` | unset |
//! | `NEWSWIRE_ENABLE_WORDPRESS` | - | `true` |
//! | `NEWSWIRE_ENABLE_SUPABASE` | - | `true` |
//! | `NEWSWIRE_SERVICE_MODE` | - | `auto` |
//! | `NEWSWIRE_ENABLE_FALLBACK` | - | `true` |
//! | `NEWSWIRE_RETRY_ATTEMPTS` | - | `3` |
//! | `NEWSWIRE_TIMEOUT_MS` | - | `10000` |
//! | `NEWSWIRE_HEALTH_CHECK_INTERVAL_MS` | - | `60000` |
//! | `NEWSWIRE_PROBE_TIMEOUT_MS` | - | `5000` |
//! | `NEWSWIRE_CACHE_TTL_MINUTES` | - | `5` |

use std::env;
use std::time::Duration;

use crate::{ConfigError, ServiceMode};

/// WordPress REST API location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPressConfig {
    /// Site root, e.g. `https://news.example.com`.
    pub base_url: String,
}

/// Supabase project location and public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    pub anon_key: String,
}

/// Static configuration consumed when the service manager is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// `None` when the WordPress adapter is disabled or has no URL.
    pub wordpress: Option<WordPressConfig>,
    /// `None` when the Supabase adapter is disabled or incomplete.
    pub supabase: Option<SupabaseConfig>,
    pub default_mode: ServiceMode,
    pub enable_fallback: bool,
    /// Consecutive failovers allowed per operation before errors surface.
    pub retry_attempts: u32,
    /// Timeout attached to every adapter HTTP request.
    pub request_timeout: Duration,
    pub health_check_interval: Duration,
    pub probe_timeout: Duration,
    /// Lifetime of adapter-cached responses.
    pub cache_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            wordpress: None,
            supabase: None,
            default_mode: ServiceMode::Auto,
            enable_fallback: true,
            retry_attempts: 3,
            request_timeout: Duration::from_secs(10),
            health_check_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl ServiceConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns the value of a
    /// variable or `None` when unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |primary: &str, fallback: Option<&str>| {
            lookup(primary)
                .or_else(|| fallback.and_then(&lookup))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let enable_wordpress = parse_bool(
            "NEWSWIRE_ENABLE_WORDPRESS",
            read("NEWSWIRE_ENABLE_WORDPRESS", None),
            true,
        )?;
        let enable_supabase = parse_bool(
            "NEWSWIRE_ENABLE_SUPABASE",
            read("NEWSWIRE_ENABLE_SUPABASE", None),
            true,
        )?;

        let wordpress = read("NEWSWIRE_WORDPRESS_URL", Some("WORDPRESS_API_URL"))
            .filter(|_| enable_wordpress)
            .map(|base_url| WordPressConfig {
                base_url: trim_trailing_slash(base_url),
            });

        let supabase = match (
            read("NEWSWIRE_SUPABASE_URL", Some("SUPABASE_URL")),
            read("NEWSWIRE_SUPABASE_ANON_KEY", Some("SUPABASE_ANON_KEY")),
        ) {
            (Some(url), Some(anon_key)) if enable_supabase => Some(SupabaseConfig {
                url: trim_trailing_slash(url),
                anon_key,
            }),
            _ => None,
        };

        let default_mode = match read("NEWSWIRE_SERVICE_MODE", None) {
            Some(value) => value.parse::<ServiceMode>()?,
            None => defaults.default_mode,
        };

        Ok(Self {
            wordpress,
            supabase,
            default_mode,
            enable_fallback: parse_bool(
                "NEWSWIRE_ENABLE_FALLBACK",
                read("NEWSWIRE_ENABLE_FALLBACK", None),
                defaults.enable_fallback,
            )?,
            retry_attempts: parse_count(
                "NEWSWIRE_RETRY_ATTEMPTS",
                read("NEWSWIRE_RETRY_ATTEMPTS", None),
                defaults.retry_attempts,
            )?,
            request_timeout: Duration::from_millis(parse_number(
                "NEWSWIRE_TIMEOUT_MS",
                read("NEWSWIRE_TIMEOUT_MS", None),
                millis(defaults.request_timeout),
            )?),
            health_check_interval: Duration::from_millis(parse_number(
                "NEWSWIRE_HEALTH_CHECK_INTERVAL_MS",
                read("NEWSWIRE_HEALTH_CHECK_INTERVAL_MS", None),
                millis(defaults.health_check_interval),
            )?),
            probe_timeout: Duration::from_millis(parse_number(
                "NEWSWIRE_PROBE_TIMEOUT_MS",
                read("NEWSWIRE_PROBE_TIMEOUT_MS", None),
                millis(defaults.probe_timeout),
            )?),
            cache_ttl: Duration::from_secs(
                parse_number(
                    "NEWSWIRE_CACHE_TTL_MINUTES",
                    read("NEWSWIRE_CACHE_TTL_MINUTES", None),
                    defaults.cache_ttl.as_secs() / 60,
                )?
                .saturating_mul(60),
            ),
        })
    }

    /// Whether at least one adapter can be built.
    pub fn has_backend(&self) -> bool {
        self.wordpress.is_some() || self.supabase.is_some()
    }
}

fn parse_bool(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}

fn parse_number(key: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}

fn parse_count(key: &'static str, value: Option<String>, default: u32) -> Result<u32, ConfigError> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::ValidationError;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults_without_backends() {
        let config = config_from(&[]).expect("valid");

        assert_eq!(config, ServiceConfig::default());
        assert!(!config.has_backend());
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn reads_backends_and_tuning_values() {
        let config = config_from(&[
            ("NEWSWIRE_WORDPRESS_URL", "https://news.example.test/"),
            ("NEWSWIRE_SUPABASE_URL", "https://proj.supabase.test"),
            ("NEWSWIRE_SUPABASE_ANON_KEY", "anon"),
            ("NEWSWIRE_SERVICE_MODE", "WordPress"),
            ("NEWSWIRE_ENABLE_FALLBACK", "false"),
            ("NEWSWIRE_RETRY_ATTEMPTS", "1"),
            ("NEWSWIRE_TIMEOUT_MS", "2500"),
            ("NEWSWIRE_HEALTH_CHECK_INTERVAL_MS", "30000"),
            ("NEWSWIRE_CACHE_TTL_MINUTES", "2"),
        ])
        .expect("valid");

        assert_eq!(
            config.wordpress,
            Some(WordPressConfig {
                base_url: String::from("https://news.example.test"),
            })
        );
        assert_eq!(
            config.supabase.as_ref().map(|s| s.anon_key.as_str()),
            Some("anon")
        );
        assert_eq!(config.default_mode, ServiceMode::WordPress);
        assert!(!config.enable_fallback);
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.health_check_interval, Duration::from_secs(30));
        assert_eq!(config.cache_ttl, Duration::from_secs(120));
    }

    #[test]
    fn falls_back_to_unprefixed_variable_names() {
        let config = config_from(&[
            ("WORDPRESS_API_URL", "https://wp.example.test"),
            ("SUPABASE_URL", "https://proj.supabase.test"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .expect("valid");

        assert!(config.wordpress.is_some());
        assert!(config.supabase.is_some());
    }

    #[test]
    fn supabase_needs_both_url_and_key() {
        let config = config_from(&[("NEWSWIRE_SUPABASE_URL", "https://proj.supabase.test")])
            .expect("valid");

        assert!(config.supabase.is_none());
    }

    #[test]
    fn enable_flags_switch_adapters_off() {
        let config = config_from(&[
            ("NEWSWIRE_WORDPRESS_URL", "https://wp.example.test"),
            ("NEWSWIRE_ENABLE_WORDPRESS", "0"),
        ])
        .expect("valid");

        assert!(config.wordpress.is_none());
    }

    #[test]
    fn retry_attempts_beyond_u32_are_rejected() {
        assert_eq!(
            config_from(&[("NEWSWIRE_RETRY_ATTEMPTS", "4294967296")]),
            Err(ConfigError::InvalidNumber {
                key: "NEWSWIRE_RETRY_ATTEMPTS",
                value: String::from("4294967296"),
            })
        );
        assert_eq!(
            config_from(&[("NEWSWIRE_RETRY_ATTEMPTS", "4294967295")])
                .expect("valid")
                .retry_attempts,
            u32::MAX
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            config_from(&[("NEWSWIRE_RETRY_ATTEMPTS", "three")]),
            Err(ConfigError::InvalidNumber {
                key: "NEWSWIRE_RETRY_ATTEMPTS",
                value: String::from("three"),
            })
        );
        assert!(matches!(
            config_from(&[("NEWSWIRE_ENABLE_FALLBACK", "maybe")]),
            Err(ConfigError::InvalidBool { .. })
        ));
        assert!(matches!(
            config_from(&[("NEWSWIRE_SERVICE_MODE", "ghost")]),
            Err(ConfigError::Validation(ValidationError::InvalidServiceMode { .. }))
        ));
    }
}
