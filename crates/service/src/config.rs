use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use http::HeaderName;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "capvault";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Gateway configuration, read from TOML.
///
/// ```toml
/// storage_root = "/srv/capvault/data"
/// acl_path = "/srv/capvault/acl.json"
/// listen_port = 8080
/// principal_header = "x-remote-user"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory every served file must live under
    pub storage_root: PathBuf,
    /// ACL document, re-read for every authorization decision
    pub acl_path: PathBuf,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Header the authenticating proxy puts the principal in
    #[serde(default = "default_principal_header")]
    pub principal_header: String,
    /// Serve the default grant to requests without a principal header
    #[serde(default)]
    pub allow_anonymous: bool,
    /// Fail a decision closed when a granted bucket has no manifest
    #[serde(default)]
    pub strict_buckets: bool,
    #[serde(default = "default_cache_manifests")]
    pub cache_manifests: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily rolling log files; stdout only if unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_principal_header() -> String {
    "x-remote-user".to_string()
}

fn default_cache_manifests() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn new(storage_root: impl Into<PathBuf>, acl_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            acl_path: acl_path.into(),
            listen_port: default_listen_port(),
            principal_header: default_principal_header(),
            allow_anonymous: false,
            strict_buckets: false,
            cache_manifests: default_cache_manifests(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }

    /// `~/.capvault/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)).join(CONFIG_FILE_NAME))
    }

    /// Load and validate a config file. Relative paths inside it are resolved
    ///  against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&raw)?;

        if let Some(dir) = path.parent() {
            config.storage_root = dir.join(&config.storage_root);
            config.acl_path = dir.join(&config.acl_path);
            config.log_dir = config.log_dir.map(|log_dir| dir.join(log_dir));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;
        self.principal_header()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn principal_header(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::from_str(&self.principal_header)
            .map_err(|_| ConfigError::InvalidHeader(self.principal_header.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("invalid principal header name: {0}")]
    InvalidHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_in() {
        let config: Config = toml::from_str(
            r#"
            storage_root = "/srv/data"
            acl_path = "/srv/acl.json"
            "#,
        )
        .unwrap();
        assert_eq!(config, Config::new("/srv/data", "/srv/acl.json"));
        assert_eq!(config.listen_port, 8080);
        assert!(config.cache_manifests);
        assert!(!config.allow_anonymous);
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
        assert_eq!(config.principal_header().unwrap().as_str(), "x-remote-user");
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            storage_root = "data"
            acl_path = "/etc/capvault/acl.json"
            listen_port = 9000
            strict_buckets = true
            log_dir = "logs"
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage_root, dir.path().join("data"));
        assert_eq!(config.acl_path, PathBuf::from("/etc/capvault/acl.json"));
        assert_eq!(config.listen_port, 9000);
        assert!(config.strict_buckets);
        assert_eq!(config.log_dir, Some(dir.path().join("logs")));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::new("/srv/data", "/srv/acl.json");
        config.log_level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogLevel(_))));

        let mut config = Config::new("/srv/data", "/srv/acl.json");
        config.principal_header = "not a header".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHeader(_))));
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(toml::from_str::<Config>("listen_port = 1").is_err());
    }
}
