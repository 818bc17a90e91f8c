//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: RESTKIT_, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/restkit/{service_name}/config.toml
//! 4. System directory: /etc/restkit/{service_name}/config.toml
//! 5. Default values
//!
//! # Example
//!
//! ```toml
//! [service]
//! name = "orders"
//! log_level = "debug"
//!
//! [errors]
//! backend = "postgres"
//! link_base = "https://api.example.com/errors"
//! suppress = ["no_result"]
//!
//! [errors.overrides]
//! unique_violation = "RESOURCE_ALREADY_EXISTS"
//! connection_exception = "SERVICE_UNAVAILABLE"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::classifier::Backend;
use crate::error::Result;

const ENV_PREFIX: &str = "RESTKIT_";
const CONFIG_DIR: &str = "restkit";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Error handling configuration
    #[serde(default)]
    pub errors: ErrorsConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

/// Error classification and dispatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorsConfig {
    /// Database backend whose errors are classified
    #[serde(default)]
    pub backend: Backend,

    /// Recognise ORM sentinel errors before the backend's own
    #[serde(default)]
    pub orm: bool,

    /// Base URL for `links.about` on every REST error
    #[serde(default)]
    pub link_base: Option<String>,

    /// Database kind name (e.g. `unique_violation`) to REST code
    /// (e.g. `RESOURCE_ALREADY_EXISTS`)
    #[serde(default)]
    pub overrides: HashMap<String, String>,

    /// Database kind names whose errors produce no REST error
    #[serde(default)]
    pub suppress: Vec<String>,
}

fn default_service_name() -> String {
    "restkit".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is taken from the running binary.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(default_service_name);

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // lowest priority first
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the search path; environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Config file locations for a service, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(CONFIG_DIR);
        if let Some(path) = xdg_dirs.find_config_file(Path::new(service_name).join("config.toml")) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(CONFIG_DIR)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.name, "restkit");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.errors.backend, Backend::Generic);
        assert!(!config.errors.orm);
        assert!(config.errors.link_base.is_none());
        assert!(config.errors.overrides.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "orders"
log_level = "debug"

[errors]
backend = "mysql"
orm = true
link_base = "https://api.example.com/errors"
suppress = ["no_result"]

[errors.overrides]
unique_violation = "RESOURCE_ALREADY_EXISTS"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "orders");
        assert_eq!(config.service.log_level, "debug");
        assert_eq!(config.errors.backend, Backend::MySql);
        assert!(config.errors.orm);
        assert_eq!(
            config.errors.link_base.as_deref(),
            Some("https://api.example.com/errors")
        );
        assert_eq!(config.errors.suppress, vec!["no_result"]);
        assert_eq!(
            config.errors.overrides.get("unique_violation").map(String::as_str),
            Some("RESOURCE_ALREADY_EXISTS")
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[errors]\nbackend = \"sqlite\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.errors.backend, Backend::Sqlite);
        assert_eq!(config.service.name, "restkit");
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[errors]\nbackend = \"oracle\"").unwrap();

        let result = Config::load_from(file.path());
        assert!(matches!(result, Err(crate::error::Error::Config(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.errors.backend, Backend::Generic);
    }
}
