//! Configuration management for hostbridge

use crate::error::ConfigError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding `http.port`.
pub const PORT_ENV: &str = "HOSTBRIDGE_PORT";

/// Environment variable overriding `inventory.packages_dir`.
pub const PACKAGES_DIR_ENV: &str = "HOSTBRIDGE_PACKAGES_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Credential source configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Component inventory configuration
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Status report configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// HTTP bind address
    #[serde(default = "default_http_host")]
    pub host: String,

    /// HTTP port for the status endpoint
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Idle connection read timeout, in seconds
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

/// Where the shared secret comes from. The secret itself never lives in this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Mounted secret file holding the API key (used when the variable is unset)
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_key_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Directory scanned for installed packages
    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,

    /// File name suffix marking a package
    #[serde(default = "default_package_suffix")]
    pub package_suffix: String,

    /// Version reported for every discovered package
    #[serde(default = "default_placeholder_version")]
    pub placeholder_version: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            packages_dir: default_packages_dir(),
            package_suffix: default_package_suffix(),
            placeholder_version: default_placeholder_version(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Identifier of the embedding platform
    #[serde(default = "default_loader_type")]
    pub loader_type: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            loader_type: default_loader_type(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            auth: AuthConfig::default(),
            inventory: InventoryConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No configuration at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `HOSTBRIDGE_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(PORT_ENV) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.http.port = port,
                Err(_) => warn!("Invalid {}: {}", PORT_ENV, raw),
            }
        }

        if let Some(raw) = lookup(PACKAGES_DIR_ENV) {
            if raw.trim().is_empty() {
                warn!("Ignoring empty {}", PACKAGES_DIR_ENV);
            } else {
                self.inventory.packages_dir = PathBuf::from(raw);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.host.trim().is_empty() {
            return Err(ConfigError::Invalid("HTTP host must not be empty".into()));
        }

        if self.http.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "HTTP read timeout must be non-zero".into(),
            ));
        }

        if self.auth.api_key_file.is_none() && self.auth.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "auth needs either api_key_env or api_key_file".into(),
            ));
        }

        if self.inventory.package_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "Inventory package_suffix must not be empty".into(),
            ));
        }

        if self.report.loader_type.trim().is_empty() {
            return Err(ConfigError::Invalid("Report loader_type must not be empty".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, PACKAGES_DIR_ENV, PORT_ENV};
    use std::path::PathBuf;

    #[test]
    fn defaults_match_documented_surface() {
        let cfg = Config::default();
        assert_eq!(cfg.http.port, 8080);
        assert_eq!(cfg.inventory.packages_dir, PathBuf::from("mods"));
        assert_eq!(cfg.inventory.package_suffix, ".jar");
        assert_eq!(cfg.inventory.placeholder_version, "1.0.0");
        assert_eq!(cfg.report.loader_type, "Fabric");
        assert_eq!(cfg.auth.api_key_env, "HOSTBRIDGE_API_KEY");
        assert!(cfg.auth.api_key_file.is_none());
        assert!(cfg.validate().is_ok());
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn env_overrides_replace_port_and_packages_dir() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(lookup(&[
            (PORT_ENV, " 9100 "),
            (PACKAGES_DIR_ENV, "/srv/host/mods"),
        ]));
        assert_eq!(cfg.http.port, 9100);
        assert_eq!(cfg.inventory.packages_dir, PathBuf::from("/srv/host/mods"));
    }

    #[test]
    fn invalid_or_empty_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.http.port = 9000;
        cfg.apply_overrides_from(lookup(&[(PORT_ENV, "not-a-port"), (PACKAGES_DIR_ENV, "  ")]));
        assert_eq!(cfg.http.port, 9000);
        assert_eq!(cfg.inventory.packages_dir, PathBuf::from("mods"));

        cfg.apply_overrides_from(lookup(&[(PORT_ENV, "70000")]));
        assert_eq!(cfg.http.port, 9000);
    }

    #[test]
    fn unset_env_leaves_config_untouched() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(lookup(&[]));
        assert_eq!(cfg.http.port, 8080);
        assert_eq!(cfg.inventory.packages_dir, PathBuf::from("mods"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml(
            r#"
            [http]
            port = 9000

            [inventory]
            packages_dir = "/srv/host/plugins"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.http.port, 9000);
        assert_eq!(cfg.http.host, "0.0.0.0");
        assert_eq!(cfg.inventory.packages_dir, PathBuf::from("/srv/host/plugins"));
        assert_eq!(cfg.inventory.package_suffix, ".jar");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load(&PathBuf::from("/nonexistent/hostbridge.toml")).unwrap();
        assert_eq!(cfg.http.port, 8080);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(Config::from_toml("[http\nport = ").is_err());
    }

    #[test]
    fn validate_rejects_empty_suffix() {
        let mut cfg = Config::default();
        cfg.inventory.package_suffix.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.http.read_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_requires_a_credential_source() {
        let mut cfg = Config::default();
        cfg.auth.api_key_env = String::new();
        assert!(cfg.validate().is_err());
        cfg.auth.api_key_file = Some(PathBuf::from("/run/secrets/key"));
        assert!(cfg.validate().is_ok());
    }
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_read_timeout_secs() -> u64 {
    5
}

fn default_api_key_env() -> String {
    "HOSTBRIDGE_API_KEY".to_string()
}

fn default_packages_dir() -> PathBuf {
    PathBuf::from("mods")
}

fn default_package_suffix() -> String {
    ".jar".to_string()
}

fn default_placeholder_version() -> String {
    "1.0.0".to_string()
}

fn default_loader_type() -> String {
    "Fabric".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
