//! # Ymir Codegen
//!
//! The emission engine: per-target modules that walk the parsed
//! [`Project`](ymir_core::Project) and produce source trees.
//!
//! - [`express`] - a single-file Node/Express handler base class
//! - [`java`] - a Java Spring-Boot controller scaffold built on a
//!   class/method/field builder IR
//! - [`frontend`] - optional static HTML pages plus a typed REST client
//!
//! Every emitter implements [`Emitter`] and returns [`GeneratedFile`]
//! artifacts; nothing here touches the filesystem. Emission is
//! deterministic: the same project yields byte-identical artifacts.

pub mod express;
pub mod frontend;
pub mod java;

mod writer;

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use ymir_core::auth::BearerMode;
use ymir_core::router::Project;

/// A single generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Path relative to the output directory.
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Errors raised while emitting a target.
///
/// Emitters abort on the first unsupported construct; the error unwinds
/// to the driver, which reports it and exits nonzero.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("unknown target `{0}`")]
    UnknownTarget(String),

    #[error("unknown middleware `{name}` at {at}")]
    UnknownMiddleware { name: String, at: String },

    #[error("unknown auth block `{0}`")]
    UnknownAuthBlock(String),

    #[error("render `{kind}` is not supported for {method} routes (at {at})")]
    UnsupportedRender {
        kind: String,
        method: String,
        at: String,
    },

    #[error("{what} (at {at})")]
    Unsupported { what: String, at: String },
}

/// Default bearer-token generation level from the project configuration,
/// used when an auth block does not set its own `mode` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BearerAuthLevel {
    #[default]
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "BASIC")]
    Basic,
    #[serde(rename = "FULL")]
    Full,
}

impl BearerAuthLevel {
    pub fn as_mode(self) -> BearerMode {
        match self {
            BearerAuthLevel::None => BearerMode::None,
            BearerAuthLevel::Basic => BearerMode::Basic,
            BearerAuthLevel::Full => BearerMode::Full,
        }
    }
}

/// Java target configuration (the `target` mapping of `ymir.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JavaConfig {
    /// Base package of the generated application.
    pub main: String,
    /// Package for generated DTO classes.
    pub dto: String,
    /// Package for generated configuration classes.
    pub config: String,
    /// Package for controllers and handler interfaces.
    pub controller: String,
    /// Package for authenticator interfaces and auth utilities.
    pub auth: String,
    /// Also emit the Spring-Security CORS filter chain.
    pub use_spring_security: bool,
    /// Append the raw `HttpServletRequest` to every handler signature.
    pub append_request: bool,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            main: "com.ymir.app".to_string(),
            dto: "com.ymir.app.dto".to_string(),
            config: "com.ymir.app.config".to_string(),
            controller: "com.ymir.app.controller".to_string(),
            auth: "com.ymir.app.auth".to_string(),
            use_spring_security: false,
            append_request: false,
        }
    }
}

/// Configuration shared by the emitters.
#[derive(Debug, Clone, Default)]
pub struct EmitterConfig {
    pub java: JavaConfig,
    /// Fallback bearer mode (`generateBearerAuth` in `ymir.json`).
    pub bearer: BearerAuthLevel,
}

/// A code emitter for one backend target.
pub trait Emitter {
    /// The target name this emitter serves.
    fn target(&self) -> &'static str;

    /// Walk the project and produce its artifacts.
    fn emit(&self, project: &Project) -> Result<Vec<GeneratedFile>, EmitError>;
}

/// Select the emitter for the project's `target` declaration.
pub fn emitter_for(
    target: &str,
    config: &EmitterConfig,
) -> Result<Box<dyn Emitter>, EmitError> {
    match target {
        "JavaScript_ExpressJS" | "JavaScript" | "Express" => {
            Ok(Box::new(express::ExpressEmitter::new(config.clone())))
        }
        "Java_SpringBoot" | "Java" => Ok(Box::new(java::JavaEmitter::new(config.clone()))),
        other => Err(EmitError::UnknownTarget(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_registry() {
        let config = EmitterConfig::default();
        assert_eq!(
            emitter_for("JavaScript_ExpressJS", &config)
                .unwrap()
                .target(),
            "JavaScript_ExpressJS"
        );
        assert_eq!(
            emitter_for("Java_SpringBoot", &config).unwrap().target(),
            "Java_SpringBoot"
        );
        assert!(matches!(
            emitter_for("Cobol", &config),
            Err(EmitError::UnknownTarget(_))
        ));
    }

    #[test]
    fn test_java_config_defaults() {
        let config = JavaConfig::default();
        assert_eq!(config.controller, "com.ymir.app.controller");
        assert!(!config.use_spring_security);
    }
}
