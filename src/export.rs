use crate::model::GuideEntry;
use crate::store::{Store, Table};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Writes `table` to `path`: a header of column names, then one line per row.
pub fn export_table(store: &Store, table: Table, path: &Path, delimiter: u8) -> Result<usize> {
    let rows = store.table_rows(table)?;

    let mut writer = open_writer(path, delimiter)?;
    writer.write_record(table.columns())?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush export {}", path.display()))?;

    info!(
        table = table.name(),
        rows = rows.len(),
        file = %path.display(),
        "exported table"
    );
    Ok(rows.len())
}

pub fn write_guide_csv(entries: &[GuideEntry], path: &Path) -> Result<usize> {
    let mut writer = open_writer(path, b',')?;
    writer.write_record(["Movie Title", "Tomatometer Score"])?;
    for entry in entries {
        writer.write_record([entry.title.as_str(), entry.score.as_str()])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush export {}", path.display()))?;
    Ok(entries.len())
}

fn open_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export directory {}", parent.display()))?;
    }

    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("failed to create export file {}", path.display()))
}
