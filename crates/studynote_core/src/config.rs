//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Collect storage, remote and logging settings in one value.
//! - Reject malformed values with the offending variable named.
//!
//! # Invariants
//! - An absent data directory means in-memory storage, not an error.
//! - An absent remote URL means no remote source.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable names.
pub mod env_vars {
    pub const DATA_DIR: &str = "STUDYNOTE_DATA_DIR";
    pub const REMOTE_URL: &str = "STUDYNOTE_REMOTE_URL";
    /// Opaque bearer token of the current user.
    pub const AUTH_TOKEN: &str = "STUDYNOTE_AUTH_TOKEN";
    pub const REMOTE_TIMEOUT_SECS: &str = "STUDYNOTE_REMOTE_TIMEOUT_SECS";
    pub const LOG_LEVEL: &str = "STUDYNOTE_LOG_LEVEL";
    pub const LOG_DIR: &str = "STUDYNOTE_LOG_DIR";
}

pub mod defaults {
    pub const REMOTE_TIMEOUT_SECS: u64 = 10;
    pub const DB_FILE_NAME: &str = "studynote.sqlite3";
}

/// Variable lookup used by `CoreConfig::from_source`.
pub trait ConfigSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> ConfigSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid {
        variable: &'static str,
        value: String,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid {
                variable,
                value,
                message,
            } => write!(f, "invalid `{variable}` value `{value}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Runtime settings for a `StudyWorkspace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Directory holding the SQLite file; `None` keeps data in memory.
    pub data_dir: Option<PathBuf>,
    pub remote_base_url: Option<String>,
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            remote_base_url: None,
            auth_token: None,
            request_timeout: Duration::from_secs(defaults::REMOTE_TIMEOUT_SECS),
            log_level: None,
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// In-memory storage, no remote.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &impl ConfigSource) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            source
                .var(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let request_timeout = match read(env_vars::REMOTE_TIMEOUT_SECS) {
            None => Duration::from_secs(defaults::REMOTE_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        variable: env_vars::REMOTE_TIMEOUT_SECS,
                        value: raw,
                        message: "expected a positive number of seconds".to_string(),
                    })
                }
            },
        };

        let remote_base_url = read(env_vars::REMOTE_URL);
        if let Some(url) = remote_base_url.as_deref() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    variable: env_vars::REMOTE_URL,
                    value: url.to_string(),
                    message: "expected an http(s) URL".to_string(),
                });
            }
        }

        let log_dir = read(env_vars::LOG_DIR).map(PathBuf::from);
        if let Some(dir) = log_dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    variable: env_vars::LOG_DIR,
                    value: dir.display().to_string(),
                    message: "expected an absolute path".to_string(),
                });
            }
        }

        Ok(Self {
            data_dir: read(env_vars::DATA_DIR).map(PathBuf::from),
            remote_base_url,
            auth_token: read(env_vars::AUTH_TOKEN),
            request_timeout,
            log_level: read(env_vars::LOG_LEVEL),
            log_dir,
        })
    }

    /// SQLite file inside the data directory, if one is configured.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(defaults::DB_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::{env_vars, ConfigError, CoreConfig};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_in_memory_defaults() {
        let config = CoreConfig::from_source(&source(&[])).unwrap();
        assert_eq!(config, CoreConfig::in_memory());
        assert_eq!(config.db_path(), None);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_all_variables() {
        let config = CoreConfig::from_source(&source(&[
            (env_vars::DATA_DIR, "/tmp/studynote"),
            (env_vars::REMOTE_URL, "https://api.example.com/v1"),
            (env_vars::AUTH_TOKEN, " token-1 "),
            (env_vars::REMOTE_TIMEOUT_SECS, "3"),
            (env_vars::LOG_LEVEL, "debug"),
        ]))
        .unwrap();

        assert_eq!(
            config.db_path(),
            Some(PathBuf::from("/tmp/studynote/studynote.sqlite3"))
        );
        assert_eq!(
            config.remote_base_url.as_deref(),
            Some("https://api.example.com/v1")
        );
        assert_eq!(config.auth_token.as_deref(), Some("token-1"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn blank_values_are_treated_as_absent() {
        let config =
            CoreConfig::from_source(&source(&[(env_vars::REMOTE_URL, "   ")])).unwrap();
        assert_eq!(config.remote_base_url, None);
    }

    #[test]
    fn zero_timeout_names_the_variable() {
        let err = CoreConfig::from_source(&source(&[(env_vars::REMOTE_TIMEOUT_SECS, "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { variable, .. } if variable == env_vars::REMOTE_TIMEOUT_SECS
        ));
        assert!(err.to_string().contains("STUDYNOTE_REMOTE_TIMEOUT_SECS"));
    }

    #[test]
    fn non_http_remote_url_is_rejected() {
        let err = CoreConfig::from_source(&source(&[(env_vars::REMOTE_URL, "ftp://host")]))
            .unwrap_err();
        assert!(err.to_string().contains("STUDYNOTE_REMOTE_URL"));
    }
}
