//! Configuration file loading for the CLI.
//!
//! Projects may place a `ymir.json` beside the entry script; all fields
//! are optional. An explicit `--config` path wins over the implicit
//! lookup, and a missing file falls back to the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use ymir_codegen::{BearerAuthLevel, EmitterConfig, JavaConfig};

/// Configuration-related errors for the CLI.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse `{path}`: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("missing configuration file: {0}")]
    MissingFile(PathBuf),
}

/// Frontend generation settings (`frontend` mapping of `ymir.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrontendConfig {
    /// Frontend flavor; only `vanilla` exists today.
    pub mode: String,
    /// Output directory for the frontend, relative to the working
    /// directory. Defaults to `<output>/frontend`.
    pub output: Option<String>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            mode: "vanilla".to_string(),
            output: None,
        }
    }
}

/// Application configuration loaded from `ymir.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Output directory, relative to the working directory.
    pub output: String,
    /// Raise logger verbosity to `debug`.
    pub debug: bool,
    /// Render diagnostics with underlined source spans.
    pub detailed_errors: bool,
    /// Target-specific configuration (Java packages and switches).
    pub target: JavaConfig,
    /// Default bearer mode for blocks without a `mode` option.
    pub generate_bearer_auth: BearerAuthLevel,
    /// Frontend generation, if requested.
    pub frontend: Option<FrontendConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: "build".to_string(),
            debug: false,
            detailed_errors: false,
            target: JavaConfig::default(),
            generate_bearer_auth: BearerAuthLevel::default(),
            frontend: None,
        }
    }
}

impl AppConfig {
    /// The emitter-facing slice of this configuration.
    pub fn emitter_config(&self) -> EmitterConfig {
        EmitterConfig {
            java: self.target.clone(),
            bearer: self.generate_bearer_auth,
        }
    }
}

/// Find and load the configuration.
///
/// Search order:
/// 1. The explicit `--config` path, which must exist
/// 2. `ymir.json` beside the entry script
/// 3. Defaults when neither is present
pub fn load_config(
    explicit_path: Option<&str>,
    entry: &Path,
) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit_path {
        let path = Path::new(path);
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        return load_config_file(path);
    }

    let implicit = entry
        .parent()
        .map(|dir| dir.join("ymir.json"))
        .unwrap_or_else(|| PathBuf::from("ymir.json"));
    if implicit.exists() {
        info!(path = implicit.display().to_string(); "Loading configuration beside the script");
        return load_config_file(&implicit);
    }

    debug!("No configuration file found, using defaults");
    Ok(AppConfig::default())
}

fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.output, "build");
        assert!(!config.debug);
        assert!(!config.detailed_errors);
        assert!(config.frontend.is_none());
        assert_eq!(config.generate_bearer_auth, BearerAuthLevel::None);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "output": "dist",
                "generateBearerAuth": "FULL",
                "target": { "controller": "org.acme.web" },
                "frontend": { "output": "dist/web" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.output, "dist");
        assert_eq!(config.generate_bearer_auth, BearerAuthLevel::Full);
        assert_eq!(config.target.controller, "org.acme.web");
        // Unspecified target fields keep their defaults.
        assert_eq!(config.target.dto, "com.ymir.app.dto");
        let frontend = config.frontend.unwrap();
        assert_eq!(frontend.mode, "vanilla");
        assert_eq!(frontend.output.as_deref(), Some("dist/web"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let result = load_config(Some("does-not-exist.json"), Path::new("main.ymr"));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }
}
