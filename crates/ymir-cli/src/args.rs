//! Command-line argument definitions for the Ymir CLI.
//!
//! This module defines the [`Args`] structure parsed from the command
//! line using [`clap`]. Arguments control the input script, output
//! directory, configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Ymir compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Ymir script
    #[arg(help = "Path to the input .ymr script")]
    pub input: String,

    /// Output directory (overrides the configuration file)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to the configuration file (ymir.json)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
