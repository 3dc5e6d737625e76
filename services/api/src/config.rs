//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use portfolio_copilot_core::{CleanupPolicy, DialogueSettings, TriggerMatching};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where conversation sessions are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionBackend {
    Postgres { database_url: String },
    Memory,
}

/// Which hosted chat-completion API the adapters talk to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi {
        api_key: String,
        api_base: Option<String>,
    },
    Azure {
        endpoint: String,
        api_key: String,
        api_version: String,
        deployment: String,
    },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub session_backend: SessionBackend,
    pub llm: LlmProvider,
    pub chat_model: String,
    pub description_model: String,
    pub github_token: Option<String>,
    pub github_owner: String,
    pub github_repo: String,
    pub github_branch: String,
    pub github_api_base: String,
    pub portfolio_path: String,
    pub http_timeout: Duration,
    pub trigger_matching: TriggerMatching,
    pub session_cleanup: CleanupPolicy,
    pub default_user_id: String,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address_str = or_default("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Session Storage ---
        let session_backend = match or_default("SESSION_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => SessionBackend::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            "memory" => SessionBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SESSION_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        // --- Chat Model Provider ---
        // Azure is used whenever an endpoint is configured.
        let llm = match var("AZURE_OPENAI_ENDPOINT") {
            Some(endpoint) => LlmProvider::Azure {
                endpoint,
                api_key: required("AZURE_OPENAI_KEY")?,
                api_version: or_default("AZURE_OPENAI_API_VERSION", "2025-01-01-preview"),
                deployment: or_default("DEPLOYMENT_NAME", "gpt-4o"),
            },
            None => LlmProvider::OpenAi {
                api_key: required("OPENAI_API_KEY")?,
                api_base: var("OPENAI_API_BASE"),
            },
        };
        let chat_model = or_default("CHAT_MODEL", "gpt-4o");
        let description_model = or_default("DESCRIPTION_MODEL", "gpt-4o-mini");

        // --- Portfolio Repository ---
        let github_repo_str = required("GITHUB_REPO")?;
        let (github_owner, github_repo) = match github_repo_str.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                (owner.to_string(), repo.to_string())
            }
            _ => {
                return Err(ConfigError::InvalidValue(
                    "GITHUB_REPO".to_string(),
                    format!("'{}' is not in the form owner/name", github_repo_str),
                ))
            }
        };
        let github_token = var("GITHUB_TOKEN");
        let github_branch = or_default("GITHUB_BRANCH", "master");
        let github_api_base = or_default("GITHUB_API_BASE", "https://api.github.com")
            .trim_end_matches('/')
            .to_string();
        let portfolio_path = or_default("PORTFOLIO_PATH", "index.html");

        let timeout_str = or_default("HTTP_TIMEOUT_SECS", "30");
        let http_timeout = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "HTTP_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        // --- Conversation Behaviour ---
        let trigger_matching = match parse_bool("TRIGGER_CASE_SENSITIVE", var("TRIGGER_CASE_SENSITIVE"))? {
            true => TriggerMatching::CaseSensitive,
            false => TriggerMatching::CaseInsensitive,
        };
        let session_cleanup = match or_default("SESSION_CLEANUP", "on_completion").to_lowercase().as_str() {
            "on_completion" => CleanupPolicy::OnCompletion,
            "on_publish_success" => CleanupPolicy::OnPublishSuccess,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SESSION_CLEANUP".to_string(),
                    format!("'{}' is not one of on_completion, on_publish_success", other),
                ))
            }
        };
        let default_user_id = or_default("DEFAULT_USER_ID", "default_user");
        let cors_origin = var("CORS_ORIGIN");

        Ok(Self {
            bind_address,
            log_level,
            session_backend,
            llm,
            chat_model,
            description_model,
            github_token,
            github_owner,
            github_repo,
            github_branch,
            github_api_base,
            portfolio_path,
            http_timeout,
            trigger_matching,
            session_cleanup,
            default_user_id,
            cors_origin,
        })
    }

    pub fn dialogue_settings(&self) -> DialogueSettings {
        DialogueSettings {
            matching: self.trigger_matching,
            cleanup: self.session_cleanup,
        }
    }
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("false") | Some("0") | Some("no") => Ok(false),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("SESSION_BACKEND", "memory"),
        ("OPENAI_API_KEY", "sk-test"),
        ("GITHUB_REPO", "octo/octo.github.io"),
    ];

    #[test]
    fn defaults_are_applied() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.session_backend, SessionBackend::Memory);
        assert_eq!(config.github_owner, "octo");
        assert_eq!(config.github_repo, "octo.github.io");
        assert_eq!(config.github_branch, "master");
        assert_eq!(config.portfolio_path, "index.html");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.trigger_matching, TriggerMatching::CaseInsensitive);
        assert_eq!(config.session_cleanup, CleanupPolicy::OnCompletion);
        assert_eq!(config.default_user_id, "default_user");
        assert!(matches!(config.llm, LlmProvider::OpenAi { api_base: None, .. }));
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = load(&[("OPENAI_API_KEY", "sk-test"), ("GITHUB_REPO", "a/b")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref v) if v == "DATABASE_URL"));
    }

    #[test]
    fn azure_endpoint_selects_azure_provider() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"));
        vars.push(("AZURE_OPENAI_KEY", "azure-key"));
        let config = load(&vars).unwrap();
        match config.llm {
            LlmProvider::Azure {
                api_version,
                deployment,
                ..
            } => {
                assert_eq!(api_version, "2025-01-01-preview");
                assert_eq!(deployment, "gpt-4o");
            }
            other => panic!("expected azure, got {:?}", other),
        }
    }

    #[test]
    fn malformed_repo_is_rejected() {
        let err = load(&[
            ("SESSION_BACKEND", "memory"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GITHUB_REPO", "just-a-name"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "GITHUB_REPO"));
    }

    #[test]
    fn conversation_switches_are_parsed() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("TRIGGER_CASE_SENSITIVE", "true"));
        vars.push(("SESSION_CLEANUP", "on_publish_success"));
        let settings = load(&vars).unwrap().dialogue_settings();
        assert_eq!(settings.matching, TriggerMatching::CaseSensitive);
        assert_eq!(settings.cleanup, CleanupPolicy::OnPublishSuccess);

        let mut vars = MINIMAL.to_vec();
        vars.push(("SESSION_CLEANUP", "never"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("HTTP_TIMEOUT_SECS", "0"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidValue(ref v, _) if v == "HTTP_TIMEOUT_SECS"
        ));
    }
}
