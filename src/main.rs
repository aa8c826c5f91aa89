use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use movie_ranks::config::{AppConfig, load_config_or_default};
use movie_ranks::fetch::HttpFetcher;
use movie_ranks::harness::{HarnessOptions, run_harness};
use movie_ranks::pipeline::{SyncOptions, export_tables, scrape_guide, sync_movies};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "movie_ranks",
    about = "Scrapes box-office grosses and critic scores into SQLite and CSV"
)]
struct Cli {
    #[arg(long, default_value = "movie_ranks.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape, store, reconcile scores and export (the default).
    Run,
    /// Re-export the stored tables to CSV.
    Export,
    /// Save the editorial best-new-movies list to CSV.
    Guide,
    /// Check the configuration and exit.
    Validate,
    /// Run the full sync twice against a scratch store.
    Harness {
        #[arg(long, default_value = "data/harness")]
        work_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = load_config_or_default(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config)?,
        Commands::Export => {
            for path in export_tables(&config)? {
                info!(file = %path.display(), "export written");
            }
        }
        Commands::Guide => {
            let fetcher = HttpFetcher::new(&config)?;
            if let Some(export) = scrape_guide(&config, &fetcher)? {
                info!(
                    movies = export.entries,
                    file = %export.path.display(),
                    "guide export complete"
                );
            }
        }
        Commands::Validate => {
            println!("OK: {}", cli.config.display());
        }
        Commands::Harness { work_dir } => {
            let fetcher = HttpFetcher::new(&config)?;
            let report = run_harness(
                &HarnessOptions {
                    config,
                    work_dir,
                    today: Local::now().date_naive(),
                },
                &fetcher,
            )?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn run(config: AppConfig) -> Result<()> {
    let fetcher = HttpFetcher::new(&config)?;
    let report = sync_movies(&SyncOptions::for_today(config), &fetcher)?;

    info!(
        aborted = report.aborted,
        box_office = report.box_office_stored,
        titles = report.titles_checked,
        scores = report.scores_found,
        not_found = report.not_found,
        errors = report.transient_errors,
        config_errors = report.config_errors,
        rankings = report.rankings_written,
        "run summary"
    );
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
