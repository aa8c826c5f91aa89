//! SQLite-backed dataset store.
//!
//! Tables:
//! - box_office: one row per listing entry per scrape
//! - rankings: critic scores, one batch per pulled_at day
//!
//! Every call opens its own connection; the schema is created on demand.

use crate::model::{BoxOfficeRecord, RankingRecord};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    BoxOffice,
    Rankings,
}

impl Table {
    pub const ALL: [Table; 2] = [Table::BoxOffice, Table::Rankings];

    pub fn name(self) -> &'static str {
        match self {
            Table::BoxOffice => "box_office",
            Table::Rankings => "rankings",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::BoxOffice => &[
                "id",
                "title",
                "total_gross",
                "release_date",
                "distributor",
                "pulled_at",
            ],
            Table::Rankings => &["id", "title", "tomatometer_score", "pulled_at"],
        }
    }
}

pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS box_office (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            total_gross TEXT,
            release_date TEXT,
            distributor TEXT,
            pulled_at TEXT
        )
        "#,
        [],
    )?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS rankings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT,
            tomatometer_score TEXT,
            pulled_at TEXT
        )
        "#,
        [],
    )?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(&self.path)
            .with_context(|| format!("failed to open database {}", self.path.display()))?;
        create_tables(&conn).context("failed to create tables")?;
        Ok(conn)
    }

    /// Appends records without any deduplication.
    pub fn append_box_office(&self, records: &[BoxOfficeRecord]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        insert_box_office(&tx, records)?;
        tx.commit()?;
        Ok(records.len())
    }

    /// Replaces every box-office row pulled on `day` with `records`.
    pub fn replace_box_office_for_day(
        &self,
        day: NaiveDate,
        records: &[BoxOfficeRecord],
    ) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM box_office WHERE pulled_at = ?1",
            params![format_date(day)],
        )?;
        insert_box_office(&tx, records)?;
        tx.commit()?;
        Ok(records.len())
    }

    /// Distinct titles in first-seen order.
    pub fn distinct_titles(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT title FROM box_office WHERE title IS NOT NULL GROUP BY title ORDER BY MIN(id)",
        )?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(titles)
    }

    /// Deletes the rankings batch for `day` and inserts `records` in its place.
    pub fn replace_rankings_for_day(
        &self,
        day: NaiveDate,
        records: &[RankingRecord],
    ) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM rankings WHERE pulled_at = ?1",
            params![format_date(day)],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rankings (title, tomatometer_score, pulled_at) VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.title,
                    record.tomatometer_score,
                    format_date(record.pulled_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn box_office_records(&self) -> Result<Vec<BoxOfficeRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT title, total_gross, release_date, distributor, pulled_at
             FROM box_office ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(BoxOfficeRecord {
                    title: row.get(0)?,
                    total_gross: row.get(1)?,
                    release_date: row.get(2)?,
                    distributor: row.get(3)?,
                    pulled_at: date_column(row, 4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn rankings(&self) -> Result<Vec<RankingRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT title, tomatometer_score, pulled_at FROM rankings ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RankingRecord {
                    title: row.get(0)?,
                    tomatometer_score: row.get(1)?,
                    pulled_at: date_column(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count(&self, table: Table) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// All rows of `table` in column order, every value rendered as text.
    pub fn table_rows(&self, table: Table) -> Result<Vec<Vec<String>>> {
        let conn = self.connect()?;
        let columns = table.columns();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            columns.join(", "),
            table.name()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                (0..columns.len())
                    .map(|idx| row.get::<_, Value>(idx).map(value_to_text))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn insert_box_office(conn: &Connection, records: &[BoxOfficeRecord]) -> Result<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO box_office (title, total_gross, release_date, distributor, pulled_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?;
    for record in records {
        stmt.execute(params![
            record.title,
            record.total_gross,
            record.release_date,
            record.distributor,
            format_date(record.pulled_at),
        ])?;
    }
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}
