//! Application settings and hosting configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// How the dialogue controller treats moves missing from the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Log a warning and move anyway.
    #[default]
    Permissive,
    /// Refuse the move and keep the current state.
    Strict,
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissive => f.write_str("permissive"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" | "lenient" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidValue {
                var: "TRANSITION_POLICY",
                value: s.to_owned(),
            }),
        }
    }
}

/// GitHub Pages hosting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token with `repo` scope.
    pub token: String,

    /// Account that owns the generated repositories.
    pub username: String,

    /// REST API root.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Prefix for generated repository names.
    #[serde(default = "default_repo_prefix")]
    pub repo_prefix: String,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_owned()
}

fn default_repo_prefix() -> String {
    "site-".to_owned()
}

impl GitHubConfig {
    /// Creates a configuration with the default API root and prefix.
    #[must_use]
    pub fn new(token: String, username: String) -> Self {
        Self {
            token,
            username,
            api_url: default_github_api_url(),
            repo_prefix: default_repo_prefix(),
        }
    }

    /// Reads `GITHUB_TOKEN`, `GITHUB_USERNAME`, `GITHUB_API_URL` and `GITHUB_REPO_PREFIX`.
    ///
    /// Returns `Ok(None)` when no token is set, so GitHub hosting stays optional.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(token) = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };

        let username = std::env::var("GITHUB_USERNAME")
            .map_err(|_| ConfigError::MissingEnvVar("GITHUB_USERNAME"))?;

        Ok(Some(Self {
            token,
            username,
            api_url: std::env::var("GITHUB_API_URL").unwrap_or_else(|_| default_github_api_url()),
            repo_prefix: std::env::var("GITHUB_REPO_PREFIX")
                .unwrap_or_else(|_| default_repo_prefix()),
        }))
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Path to the template/theme catalog JSON file.
    pub catalog_path: PathBuf,

    /// Command prefix for chat commands.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Public base URL under which `sites/` and `uploads/` are served.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Directory generated pages are written to.
    #[serde(default = "default_sites_dir")]
    pub sites_dir: PathBuf,

    /// Directory uploaded logos are written to.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    /// Idle time after which a session is expired.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Interval between sweeps of expired sessions and artifacts.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub transition_policy: TransitionPolicy,

    /// Largest accepted logo upload.
    #[serde(default = "default_max_logo_bytes")]
    pub max_logo_bytes: usize,

    /// Timeout per hosting API request.
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,

    /// Attempts per publish before giving up.
    #[serde(default = "default_publish_attempts")]
    pub publish_attempts: u32,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.json")
}

fn default_command_prefix() -> String {
    "/".to_owned()
}

fn default_public_base_url() -> String {
    "http://localhost:5000".to_owned()
}

fn default_sites_dir() -> PathBuf {
    PathBuf::from("sites")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_max_logo_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_publish_timeout() -> u64 {
    30
}

fn default_publish_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            command_prefix: default_command_prefix(),
            public_base_url: default_public_base_url(),
            sites_dir: default_sites_dir(),
            uploads_dir: default_uploads_dir(),
            session_ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            transition_policy: TransitionPolicy::default(),
            max_logo_bytes: default_max_logo_bytes(),
            publish_timeout_secs: default_publish_timeout(),
            publish_attempts: default_publish_attempts(),
            log_level: default_log_level(),
        }
    }
}

fn env_parsed<T: FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

/// Parses a configured policy, warning about and ignoring values it does not know.
fn policy_or_default(raw: Option<&str>) -> TransitionPolicy {
    match raw.map(str::parse::<TransitionPolicy>) {
        Some(Ok(policy)) => policy,
        Some(Err(e)) => {
            warn!("{}, using {}", e, TransitionPolicy::default());
            TransitionPolicy::default()
        }
        None => TransitionPolicy::default(),
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    ///
    /// Unparseable values fall back to their default.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            catalog_path: std::env::var("CATALOG_PATH")
                .map_or_else(|_| default_catalog_path(), PathBuf::from),
            command_prefix: std::env::var("COMMAND_PREFIX")
                .unwrap_or_else(|_| default_command_prefix()),
            public_base_url: std::env::var("SERVER_URL")
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or_else(|_| default_public_base_url()),
            sites_dir: std::env::var("SITES_DIR").map_or_else(|_| default_sites_dir(), PathBuf::from),
            uploads_dir: std::env::var("UPLOADS_DIR")
                .map_or_else(|_| default_uploads_dir(), PathBuf::from),
            session_ttl_secs: env_parsed("SESSION_TTL_SECS").unwrap_or_else(default_session_ttl),
            sweep_interval_secs: env_parsed("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(default_sweep_interval),
            transition_policy: policy_or_default(
                std::env::var("TRANSITION_POLICY").ok().as_deref(),
            ),
            max_logo_bytes: env_parsed("MAX_LOGO_BYTES").unwrap_or_else(default_max_logo_bytes),
            publish_timeout_secs: env_parsed("PUBLISH_TIMEOUT_SECS")
                .unwrap_or_else(default_publish_timeout),
            publish_attempts: env_parsed("PUBLISH_ATTEMPTS")
                .filter(|n| *n > 0)
                .unwrap_or_else(default_publish_attempts),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level()),
        }
    }

    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    #[must_use]
    pub const fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.command_prefix, "/");
        assert_eq!(settings.public_base_url, "http://localhost:5000");
        assert_eq!(settings.session_ttl(), Duration::from_secs(3600));
        assert_eq!(settings.max_logo_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.transition_policy, TransitionPolicy::Permissive);
    }

    #[test]
    fn test_transition_policy_parse() {
        assert_eq!("strict".parse::<TransitionPolicy>().unwrap(), TransitionPolicy::Strict);
        assert_eq!(
            " Permissive ".parse::<TransitionPolicy>().unwrap(),
            TransitionPolicy::Permissive
        );
        assert!(matches!(
            "chaotic".parse::<TransitionPolicy>(),
            Err(ConfigError::InvalidValue { var: "TRANSITION_POLICY", .. })
        ));
    }

    #[test]
    fn test_policy_or_default() {
        assert_eq!(policy_or_default(Some("strict")), TransitionPolicy::Strict);
        assert_eq!(policy_or_default(Some("chaotic")), TransitionPolicy::Permissive);
        assert_eq!(policy_or_default(None), TransitionPolicy::Permissive);
    }

    #[test]
    fn test_github_config_new() {
        let config = GitHubConfig::new("tok".to_owned(), "alice".to_owned());
        assert_eq!(config.api_url, "https://api.github.com");
        assert_eq!(config.repo_prefix, "site-");
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: BotSettings =
            serde_json::from_str(r#"{"catalog_path": "c.json", "transition_policy": "strict"}"#)
                .unwrap();
        assert_eq!(settings.transition_policy, TransitionPolicy::Strict);
        assert_eq!(settings.sweep_interval_secs, 60);
        assert_eq!(settings.sites_dir, PathBuf::from("sites"));
    }
}
