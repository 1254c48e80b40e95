//! Configuration types.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_HISTORY_TURNS: usize = 10;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

/// Which user-facing surface the binary runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    Web,
    Cli,
}

impl FromStr for Interface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "cli" => Ok(Self::Cli),
            other => Err(format!("expected \"web\" or \"cli\", got \"{other}\"")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Model API credential.
    pub api_key: SecretString,
    /// Model name sent with every completion request.
    pub model: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Listen address for the web surface.
    pub bind: SocketAddr,
    pub interface: Interface,
    /// Prior turns replayed to the model as conversation memory (0 disables).
    pub history_turns: usize,
    /// Completion token cap.
    pub max_tokens: u32,
    /// Web sessions untouched for this long are discarded.
    pub session_idle_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            model: get("ORCHESTRA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("ORCHESTRA_OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            bind: parse_or("ORCHESTRA_BIND", get("ORCHESTRA_BIND"), || {
                SocketAddr::from(([127, 0, 0, 1], 8080))
            })?,
            interface: parse_or("ORCHESTRA_INTERFACE", get("ORCHESTRA_INTERFACE"), || {
                Interface::Web
            })?,
            history_turns: parse_or(
                "ORCHESTRA_HISTORY_TURNS",
                get("ORCHESTRA_HISTORY_TURNS"),
                || DEFAULT_HISTORY_TURNS,
            )?,
            max_tokens: parse_or("ORCHESTRA_MAX_TOKENS", get("ORCHESTRA_MAX_TOKENS"), || {
                DEFAULT_MAX_TOKENS
            })?,
            session_idle_timeout: Duration::from_secs(parse_or(
                "ORCHESTRA_SESSION_IDLE_SECS",
                get("ORCHESTRA_SESSION_IDLE_SECS"),
                || DEFAULT_SESSION_IDLE_SECS,
            )?),
        })
    }
}

fn parse_or<T, D>(key: &str, raw: Option<String>, default: D) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> T,
{
    match raw {
        None => Ok(default()),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_fails_fast() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn defaults_applied() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key.expose_secret(), "sk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.interface, Interface::Web);
        assert_eq!(config.history_turns, DEFAULT_HISTORY_TURNS);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(
            config.session_idle_timeout,
            Duration::from_secs(DEFAULT_SESSION_IDLE_SECS)
        );
    }

    #[test]
    fn overrides_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("ORCHESTRA_MODEL", "gpt-4o"),
            ("ORCHESTRA_OPENAI_BASE_URL", "http://localhost:9000/v1/"),
            ("ORCHESTRA_BIND", "0.0.0.0:3000"),
            ("ORCHESTRA_INTERFACE", "CLI"),
            ("ORCHESTRA_HISTORY_TURNS", "0"),
            ("ORCHESTRA_SESSION_IDLE_SECS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.interface, Interface::Cli);
        assert_eq!(config.history_turns, 0);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(90));
    }

    #[test]
    fn invalid_value_names_the_key() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("ORCHESTRA_INTERFACE", "desktop"),
        ]))
        .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, message } => {
                assert_eq!(key, "ORCHESTRA_INTERFACE");
                assert!(message.contains("desktop"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
