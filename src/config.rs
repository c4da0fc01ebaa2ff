//! Configuration loading and management.
//!
//! Resolution order, later wins:
//! 1. Built-in defaults
//! 2. `--config <file>`, or `./taskr.yaml` when present
//! 3. Environment variables (`TASKR_DB_PATH`, `TASKR_HOST`, `TASKR_PORT`,
//!    `TASKR_SECRET_KEY`, `TASKR_USERNAME`, `TASKR_PASSWORD`)
//! 4. CLI flags, applied by the caller

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "taskr.yaml";

/// Minimum length of a configured session signing secret, in bytes.
pub const MIN_SECRET_KEY_LEN: usize = 32;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("secret_key must be at least {min} bytes (got {0})", min = MIN_SECRET_KEY_LEN)]
    SecretKeyTooShort(usize),
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Secret used to sign the session cookie. A random key is generated at
    /// start-up when absent.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// How long a login stays valid. `None` keeps it until logout or until
    /// the browser discards the cookie.
    #[serde(default)]
    pub session_max_age_secs: Option<i64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            secret_key: None,
            session_max_age_secs: None,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("taskr.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// The single credential pair that unlocks the task list.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AuthConfig {
    /// Plain equality check against the configured pair.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin".to_string()
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an explicit file, or from `./taskr.yaml` if present, or fall
    /// back to defaults. Environment overrides are applied in every case.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(db_path) = lookup("TASKR_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = lookup("TASKR_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("TASKR_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "TASKR_PORT",
                value: port,
            })?;
        }

        if let Some(secret) = lookup("TASKR_SECRET_KEY") {
            self.server.secret_key = Some(secret);
        }

        if let Some(username) = lookup("TASKR_USERNAME") {
            self.auth.username = username;
        }

        if let Some(password) = lookup("TASKR_PASSWORD") {
            self.auth.password = password;
        }

        Ok(())
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secret) = &self.server.secret_key {
            if secret.len() < MIN_SECRET_KEY_LEN {
                return Err(ConfigError::SecretKeyTooShort(secret.len()));
            }
        }
        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.db_path, PathBuf::from("taskr.db"));
        assert_eq!(config.server.port, 5000);
        assert!(config.server.secret_key.is_none());
        assert!(config.auth.matches("admin", "admin"));
    }

    #[test]
    fn load_yaml_with_partial_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taskr.yaml");
        std::fs::write(
            &path,
            "server:\n  db_path: data/tasks.db\n  port: 8080\nauth:\n  username: alice\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.db_path, PathBuf::from("data/tasks.db"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.username, "alice");
        assert_eq!(config.auth.password, "admin");
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "server: [not, a, map]\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("TASKR_DB_PATH", "/tmp/other.db"),
                ("TASKR_PORT", "9000"),
                ("TASKR_USERNAME", "bob"),
                ("TASKR_PASSWORD", "hunter2"),
            ]))
            .unwrap();

        assert_eq!(config.server.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.server.port, 9000);
        assert!(config.auth.matches("bob", "hunter2"));
        assert!(!config.auth.matches("admin", "admin"));
    }

    #[test]
    fn invalid_port_env_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("TASKR_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "TASKR_PORT", .. }));
    }

    #[test]
    fn short_secret_key_fails_validation() {
        let mut config = Config::default();
        config.server.secret_key = Some("too-short".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SecretKeyTooShort(9))
        ));

        config.server.secret_key = Some("x".repeat(MIN_SECRET_KEY_LEN));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn credentials_must_match_exactly() {
        let auth = AuthConfig::default();
        assert!(!auth.matches("admin", "Admin"));
        assert!(!auth.matches("admin ", "admin"));
        assert!(!auth.matches("", ""));
    }

    #[test]
    fn debug_output_hides_password() {
        let auth = AuthConfig {
            username: "admin".into(),
            password: "s3cret".into(),
        };
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("s3cret"));
    }
}
