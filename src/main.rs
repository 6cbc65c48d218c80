mod cleaner;
mod cli;
mod config;
mod error;
mod extractor;
mod loader;
mod models;
mod validator;

use clap::Parser;

use cli::{Cli, Commands, PathOverrides};

fn main() {
    let cli = Cli::parse();
    let config_file = cli.config.as_deref();

    let result = match cli.command {
        Commands::Extract { url, raw } => {
            let overrides = PathOverrides {
                url,
                raw,
                ..PathOverrides::none()
            };
            cli::resolve_pipeline(config_file, overrides)
                .and_then(|config| cli::extract::run(&config))
        }
        Commands::Clean { raw, clean } => {
            let overrides = PathOverrides {
                raw,
                clean,
                ..PathOverrides::none()
            };
            cli::resolve_pipeline(config_file, overrides)
                .and_then(|config| cli::clean::run(&config))
        }
        Commands::Validate { clean, validated } => {
            let overrides = PathOverrides {
                clean,
                validated,
                ..PathOverrides::none()
            };
            cli::resolve_pipeline(config_file, overrides)
                .and_then(|config| cli::validate::run(&config))
        }
        Commands::Load {
            validated,
            project_id,
            dataset_id,
            table_id,
            database,
        } => {
            let overrides = PathOverrides {
                validated,
                ..PathOverrides::none()
            };
            let warehouse = cli::resolve_warehouse(&project_id, dataset_id, table_id, database);
            cli::resolve_pipeline(config_file, overrides)
                .and_then(|config| cli::load::run(&config, &warehouse))
        }
        Commands::Run {
            project_id,
            dataset_id,
            table_id,
            database,
        } => {
            let warehouse = cli::resolve_warehouse(&project_id, dataset_id, table_id, database);
            cli::resolve_pipeline(config_file, PathOverrides::none())
                .and_then(|config| cli::run::run(&config, &warehouse))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
