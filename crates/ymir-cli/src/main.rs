use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use ymir_cli::Args;

fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Ymir");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = ymir_cli::run(&args) {
        error!("Failed: {err}");
        eprintln!("{err}");
        eprintln!("Aborting");
        process::exit(1);
    }

    info!("Completed successfully");
}
