//! Ymir CLI library.
//!
//! Drives the full compile: load configuration, parse the script through
//! the filesystem provider, report diagnostics, select the emitter for
//! the project's target, and write the generated artifacts under the
//! output directory (recreated on every run).

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;
pub use config::{AppConfig, ConfigError, FrontendConfig};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use ymir_codegen::{EmitError, Emitter, GeneratedFile, frontend::FrontendEmitter};
use ymir_parser::error::Diagnostic;
use ymir_parser::{FileProvider, ParsePolicy, SourceSet};

/// Top-level error type for a CLI run.
#[derive(Debug, Error)]
pub enum YmirError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The script did not compile; diagnostics were already reported.
    #[error("compilation failed with {errors} error(s)")]
    Compile { errors: usize },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Filesystem-backed file provider for the parser.
struct FsProvider;

impl FileProvider for FsProvider {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

/// Run the Ymir compiler.
///
/// # Errors
///
/// Returns [`YmirError`] for configuration problems, compile failures
/// (after reporting the diagnostics), emission failures, and I/O errors
/// while writing artifacts.
pub fn run(args: &Args) -> Result<(), YmirError> {
    let entry = Path::new(&args.input);
    let mut app_config = config::load_config(args.config.as_deref(), entry)?;
    if let Some(output) = &args.output {
        app_config.output = output.clone();
    }

    info!(input = args.input, output = app_config.output; "Compiling script");
    let compilation = ymir_parser::parse_project(entry, &FsProvider, ParsePolicy::CancelOnFirstError);

    report_diagnostics(
        &compilation.diagnostics,
        &compilation.sources,
        app_config.detailed_errors,
    );

    let Some(project) = compilation.project else {
        return Err(YmirError::Compile {
            errors: compilation
                .diagnostics
                .iter()
                .filter(|d| d.severity().is_error())
                .count(),
        });
    };
    debug!(project_target = project.target; "Project parsed");

    let emitter_config = app_config.emitter_config();
    let emitter = ymir_codegen::emitter_for(&project.target, &emitter_config)?;
    let files = emitter.emit(&project)?;
    info!(emitter = emitter.target(), files = files.len(); "Emitted backend artifacts");

    let output_dir = Path::new(&app_config.output);
    recreate_dir(output_dir)?;
    write_files(output_dir, &files)?;

    if let Some(frontend) = &app_config.frontend {
        let frontend_files = FrontendEmitter::new(emitter_config).emit(&project)?;
        let frontend_dir = match &frontend.output {
            Some(dir) => PathBuf::from(dir),
            None => output_dir.join("frontend"),
        };
        recreate_dir(&frontend_dir)?;
        write_files(&frontend_dir, &frontend_files)?;
        info!(files = frontend_files.len(), dir = frontend_dir.display().to_string(); "Emitted frontend");
    }

    info!(dir = output_dir.display().to_string(); "Build finished");
    Ok(())
}

/// Print every diagnostic, either as plain `file:line:column` lines or as
/// underlined miette reports when detailed errors are enabled.
fn report_diagnostics(diagnostics: &[Diagnostic], sources: &SourceSet, detailed: bool) {
    if detailed {
        let handler = miette::GraphicalReportHandler::new();
        for diag in diagnostics {
            let adapter = error_adapter::DiagnosticAdapter::new(diag, sources);
            let mut rendered = String::new();
            if handler.render_report(&mut rendered, &adapter).is_ok() {
                eprintln!("{rendered}");
            } else {
                eprintln!("{diag}");
            }
        }
        return;
    }

    for diag in diagnostics {
        let location = diag
            .file()
            .and_then(|file| {
                let text = sources.get(file)?;
                let span = diag.primary_span()?;
                let index = ymir_parser::LineIndex::new(text);
                let (line, column) = index.line_col(span.start());
                Some(format!("{file}:{line}:{column}"))
            })
            .unwrap_or_else(|| diag.file().unwrap_or("<unknown>").to_string());
        eprintln!("{location}: {diag}");
        if let Some(help) = diag.help() {
            eprintln!("    help: {help}");
        }
    }
}

/// Delete and re-create an output directory.
fn recreate_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

fn write_files(root: &Path, files: &[GeneratedFile]) -> io::Result<()> {
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = path.display().to_string(); "Writing artifact");
        fs::write(path, &file.contents)?;
    }
    Ok(())
}
