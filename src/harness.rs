use crate::config::AppConfig;
use crate::fetch::PageFetcher;
use crate::pipeline::{SyncOptions, sync_movies};
use crate::store::{Store, Table};
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub config: AppConfig,
    pub work_dir: PathBuf,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub first_run_box_office: usize,
    pub first_run_scores: usize,
    pub second_run_box_office: usize,
    pub second_run_scores: usize,
    pub box_office_rows: usize,
    pub rankings_rows: usize,
    pub rankings_rows_today: usize,
    pub csv_files: usize,
}

/// Runs the full sync twice on the same day against a scratch store under
/// `work_dir` and reports what ended up in it.
pub fn run_harness(options: &HarnessOptions, fetcher: &dyn PageFetcher) -> Result<HarnessReport> {
    if options.work_dir.exists() {
        std::fs::remove_dir_all(&options.work_dir)?;
    }

    let mut config = options.config.clone();
    config.db_path = options.work_dir.join("movies.db");
    config.out_dir = options.work_dir.join("out");

    let sync = SyncOptions {
        config: config.clone(),
        today: options.today,
    };
    let first = sync_movies(&sync, fetcher)?;
    let second = sync_movies(&sync, fetcher)?;

    let store = Store::new(&config.db_path);
    let rankings = store.rankings()?;
    let rankings_rows_today = rankings
        .iter()
        .filter(|r| r.pulled_at == options.today)
        .count();

    let mut csv_files = 0usize;
    if config.out_dir.exists() {
        for entry in WalkDir::new(&config.out_dir) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("csv")
            {
                csv_files += 1;
            }
        }
    }

    Ok(HarnessReport {
        first_run_box_office: first.box_office_stored,
        first_run_scores: first.scores_found,
        second_run_box_office: second.box_office_stored,
        second_run_scores: second.scores_found,
        box_office_rows: store.count(Table::BoxOffice)?,
        rankings_rows: rankings.len(),
        rankings_rows_today,
        csv_files,
    })
}
