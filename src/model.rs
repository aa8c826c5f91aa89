use crate::fetch::FetchError;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// One row of the box-office listing as it appeared on the day it was pulled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxOfficeRecord {
    pub title: String,
    pub total_gross: String,
    pub release_date: String,
    pub distributor: String,
    pub pulled_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingRecord {
    pub title: String,
    pub tomatometer_score: String,
    pub pulled_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideEntry {
    pub title: String,
    pub score: String,
}

/// Outcome of a lookup against a remote site.
///
/// `NotFound` is a normal answer; `TransientError` means the question could
/// not be asked and may be worth asking again later.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    TransientError(FetchError),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound | Lookup::TransientError(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Lookup::TransientError(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NotFound,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub aborted: bool,
    pub box_office_parsed: usize,
    pub box_office_stored: usize,
    pub titles_checked: usize,
    pub scores_found: usize,
    pub not_found: usize,
    pub transient_errors: usize,
    pub config_errors: usize,
    pub rankings_written: usize,
    pub box_office_export: Option<PathBuf>,
    pub rankings_export: Option<PathBuf>,
}
