mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log;
use std::path::Path;
use std::process;

use cli_args::Cli;
use output::Sink;
use procat_core::{AppError, Config, concatenate_project};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);
    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::ProjectRoot { .. }) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::WalkDir(_)) => 2,
                Some(AppError::IgnoreFile { .. }) => 2,
                Some(_) => 1,
                // Sink failures (file, stdout, clipboard) carry no core error.
                None => 3,
            };
            if !quiet {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }
            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        return commands::completion::handle_completion(shell);
    }

    let project_root = Config::determine_project_root(cli.project_dir.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config(&project_root, &cli)?;
    let sink = choose_sink(&config, cli.list, cli.quiet);

    let concatenation = concatenate_project(&project_root, &config)
        .with_context(|| format!("Error processing project {}", project_root.display()))?;

    if !cli.quiet && !concatenation.warnings().is_empty() {
        eprintln!(
            "{}",
            "⚠️ Warning: Some files were skipped:".yellow()
        );
        for warning in concatenation.warnings() {
            eprintln!(" - {}", warning);
        }
        eprintln!("---");
    }

    if cli.list {
        return sink.deliver(concatenation.listing().as_bytes(), cli.quiet);
    }
    sink.deliver(concatenation.output(), cli.quiet)
}

fn load_config(project_root: &Path, cli: &Cli) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        project_root,
        cli.config.config_file.as_ref(),
        cli.config.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    Ok(merge_config_with_cli_overrides(config, cli))
}

fn merge_config_with_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    log::trace!("Applying CLI overrides to config...");

    if !cli.filters.exclude.is_empty() {
        config.filters.exclude_extensions = cli.filters.exclude.clone();
    }
    if let Some(include) = &cli.filters.include {
        config.filters.include_file = Some(include.clone());
    }
    if cli.filters.force {
        config.filters.force = true;
    }
    if let Some(file) = &cli.output_file {
        config.output.file = Some(file.clone());
    }
    if cli.clipboard {
        config.output.clipboard = true;
    }

    log::trace!("Config after CLI overrides: {:?}", config);
    config
}

/// Picks the sink. A listing always goes to stdout. Otherwise the clipboard
/// wins over an output file; the file is then dropped so it is not excluded
/// from the walk either.
fn choose_sink(config: &Config, list: bool, quiet: bool) -> Sink {
    if list {
        return Sink::Stdout;
    }
    if config.output.clipboard {
        if let Some(file) = &config.output.file {
            if !quiet {
                eprintln!(
                    "{} --clipboard flag is set; output file '{}' will be ignored.",
                    "⚠️ Warning:".yellow(),
                    file.display()
                );
            }
        }
        return Sink::Clipboard;
    }
    match &config.output.file {
        Some(file) => Sink::File(file.clone()),
        None => Sink::Stdout,
    }
}
