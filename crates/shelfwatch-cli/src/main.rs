mod merge;
mod report;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use shelfwatch_core::{MatchMode, SchemaDrift};
use tracing_subscriber::EnvFilter;

use crate::run::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "shelfwatch")]
#[command(about = "Storefront catalog harvester with cross-run price history")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk a category listing, write a local snapshot, and update its history
    Run {
        /// Category slug from the categories file
        category: String,

        /// Only the first two sort orders, two pages each
        #[arg(long)]
        smoke: bool,

        /// Skip the history update; only the local snapshot is written
        #[arg(long)]
        no_history: bool,

        /// Override the per-ordering page cap
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// List the configured categories
    Categories,
    /// Merge a batch CSV into a history CSV offline
    Reconcile {
        /// Existing history file; may be missing
        #[arg(long)]
        history: PathBuf,

        /// Batch file to append
        #[arg(long)]
        batch: PathBuf,

        /// Where to write the merged history
        #[arg(long)]
        out: PathBuf,

        /// Column drift policy: intersection or union
        #[arg(long)]
        schema_drift: Option<SchemaDrift>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    // Usage errors and --help exit here, before any configuration is read.
    let cli = Cli::parse();

    let config = shelfwatch_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Run {
            category,
            smoke,
            no_history,
            max_pages,
        }) => {
            let options = RunOptions {
                category,
                smoke,
                no_history,
                max_pages,
            };
            let status = run::run_category(&config, &options).await?;
            tracing::info!(status = %status, "run finished");
            Ok(status.exit_code())
        }
        Some(Commands::Categories) => {
            run_list_categories(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Reconcile {
            history,
            batch,
            out,
            schema_drift,
        }) => {
            let drift = schema_drift.unwrap_or(config.schema_drift);
            merge::run_reconcile_files(&history, &batch, &out, drift).await?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            Cli::command().print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_list_categories(config: &shelfwatch_core::AppConfig) -> anyhow::Result<()> {
    let catalogue = shelfwatch_core::load_categories(&config.categories_path)?;
    for category in &catalogue.categories {
        let history = match &category.drive_folder_id {
            Some(folder) => format!("{} (drive folder {folder})", category.history_file),
            None => category.history_file.clone(),
        };
        let matching = match category.brands.match_mode {
            MatchMode::WholeWord => "whole_word",
            MatchMode::Substring => "substring",
        };
        println!(
            "{:<12} {matching:<10} {}  history: {history}",
            category.slug, category.listing_url
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests;
