use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::path::PathBuf;

use stroke_cli::cli::build_cli;
use stroke_cli::run::{execute, format_metrics, RunConfig};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or(
            "STROKE_LOG",
            "error,stroke=info,stroke_classifiers=info,stroke_cli=info",
        ))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => handle_run(run_matches),
        Some(("config", _)) => {
            println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
            Ok(())
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    match config_path {
        Some(path) => log::info!("[stroke] Running with config: {:?}", path),
        None => eprintln!("[stroke] No config file provided; using defaults."),
    }

    let config = match RunConfig::from_arguments(config_path, matches) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1)
        }
    };

    if config_path.is_none() {
        let json = serde_json::to_string_pretty(&config).unwrap_or_default();
        eprintln!("[stroke] Effective config:\n{}", json);
    }

    match execute(&config) {
        Ok(outcome) => {
            print!("{}", format_metrics(&outcome.metrics));
            Ok(())
        }
        Err(e) => {
            log::error!("Run failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
