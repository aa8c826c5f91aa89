use crate::config::{AppConfig, BoxOfficeHistory};
use crate::export::{export_table, write_guide_csv};
use crate::fetch::PageFetcher;
use crate::lookup::lookup_score;
use crate::model::{Lookup, RankingRecord, RunReport};
use crate::parser::{parse_box_office, parse_guide};
use crate::store::{Store, Table};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

pub const BOX_OFFICE_EXPORT: &str = "box_office.csv";
pub const RANKINGS_EXPORT: &str = "rankings.csv";
pub const GUIDE_EXPORT: &str = "best_new_movies.csv";

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub config: AppConfig,
    pub today: NaiveDate,
}

impl SyncOptions {
    pub fn for_today(config: AppConfig) -> Self {
        Self {
            config,
            today: Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GuideExport {
    pub entries: usize,
    pub path: PathBuf,
}

/// Scrapes the box-office listing, stores and exports it, then looks up a
/// critic score for every stored title and replaces today's rankings batch.
///
/// Failing to obtain the listing ends the run early with `aborted` set;
/// per-title failures only skip that title.
pub fn sync_movies(options: &SyncOptions, fetcher: &dyn PageFetcher) -> Result<RunReport> {
    let config = &options.config;
    let today = options.today;
    let store = Store::new(&config.db_path);
    let delimiter = export_delimiter(config)?;
    let mut report = RunReport::default();

    let listing_url = &config.sources.box_office_url;
    info!(url = %listing_url, "box office fetch start");
    let html = match fetcher.fetch(listing_url) {
        Ok(html) => html,
        Err(err) => {
            warn!(error = %err, "box office listing unavailable; nothing to do");
            report.aborted = true;
            return Ok(report);
        }
    };

    let records = match parse_box_office(&html, &config.box_office, today) {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "box office listing could not be parsed; nothing to do");
            report.aborted = true;
            return Ok(report);
        }
    };
    report.box_office_parsed = records.len();
    if records.is_empty() {
        warn!(url = %listing_url, "box office listing had no usable rows; nothing to do");
        report.aborted = true;
        return Ok(report);
    }

    report.box_office_stored = match config.box_office_history {
        BoxOfficeHistory::Append => store.append_box_office(&records)?,
        BoxOfficeHistory::ReplaceDay => store.replace_box_office_for_day(today, &records)?,
    };
    info!(
        rows = report.box_office_stored,
        history = ?config.box_office_history,
        db = %store.path().display(),
        "box office rows stored"
    );

    let box_office_path = config.export_path(BOX_OFFICE_EXPORT);
    export_table(&store, Table::BoxOffice, &box_office_path, delimiter)?;
    report.box_office_export = Some(box_office_path);

    let titles = store.distinct_titles()?;
    let delay = Duration::from_secs_f64(config.request_delay_seconds);
    let mut rankings = Vec::new();

    for (idx, title) in titles.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            std::thread::sleep(delay);
        }
        report.titles_checked += 1;

        match lookup_score(fetcher, config, title) {
            Ok(Lookup::Found(score)) => {
                info!(%title, %score, "score found");
                report.scores_found += 1;
                rankings.push(RankingRecord {
                    title: title.clone(),
                    tomatometer_score: score,
                    pulled_at: today,
                });
            }
            Ok(Lookup::NotFound) => {
                info!(%title, "no score available");
                report.not_found += 1;
            }
            Ok(Lookup::TransientError(err)) => {
                warn!(%title, url = %err.url(), error = %err, "score lookup failed; skipping");
                report.transient_errors += 1;
            }
            Err(err) => {
                error!(%title, error = %err, "search rule is broken; check the [search] config");
                report.config_errors += 1;
            }
        }
    }

    if rankings.is_empty() {
        info!(day = %today, "no scores collected; keeping existing rankings");
    } else {
        report.rankings_written = store.replace_rankings_for_day(today, &rankings)?;
        info!(day = %today, rows = report.rankings_written, "rankings replaced for day");
    }

    let rankings_path = config.export_path(RANKINGS_EXPORT);
    export_table(&store, Table::Rankings, &rankings_path, delimiter)?;
    report.rankings_export = Some(rankings_path);

    Ok(report)
}

fn export_delimiter(config: &AppConfig) -> Result<u8> {
    u8::try_from(config.export_delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| {
            format!(
                "export_delimiter {:?} must be a single ascii character",
                config.export_delimiter
            )
        })
}

/// Re-exports every store table without touching the network.
pub fn export_tables(config: &AppConfig) -> Result<Vec<PathBuf>> {
    let store = Store::new(&config.db_path);
    let delimiter = export_delimiter(config)?;

    let mut written = Vec::new();
    for table in Table::ALL {
        let path = config.export_path(&format!("{}.csv", table.name()));
        export_table(&store, table, &path, delimiter)?;
        written.push(path);
    }
    Ok(written)
}

/// Scrapes the editorial "best new movies" guide into its own CSV file.
pub fn scrape_guide(config: &AppConfig, fetcher: &dyn PageFetcher) -> Result<Option<GuideExport>> {
    let url = &config.sources.guide_url;
    let html = match fetcher.fetch(url) {
        Ok(html) => html,
        Err(err) => {
            warn!(error = %err, "guide page unavailable");
            return Ok(None);
        }
    };

    let entries = parse_guide(&html, &config.guide)?;
    if entries.is_empty() {
        warn!(%url, "guide page had no movies; nothing to save");
        return Ok(None);
    }

    let path = config.export_path(GUIDE_EXPORT);
    let written = write_guide_csv(&entries, &path)?;
    info!(movies = written, file = %path.display(), "guide saved");

    Ok(Some(GuideExport {
        entries: written,
        path,
    }))
}
