use crate::config::{BoxOfficeRule, GuideRule, ScoreRule, SearchRule};
use crate::model::{BoxOfficeRecord, GuideEntry};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Extracts box-office records from the listing table by fixed column position.
///
/// Header rows are dropped, rows shorter than `rule.min_cells` are skipped and
/// a record needs a non-empty title and gross. Columns past the end of a row
/// read as empty strings.
pub fn parse_box_office(
    html: &str,
    rule: &BoxOfficeRule,
    pulled_at: NaiveDate,
) -> Result<Vec<BoxOfficeRecord>> {
    let document = Html::parse_document(html);
    let row_selector = parse_selector(&rule.row_selector)?;
    let cell_selector = parse_selector(&rule.cell_selector)?;

    let mut records = Vec::new();
    for (index, row) in document
        .select(&row_selector)
        .enumerate()
        .skip(rule.header_rows)
    {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| element_attr_or_text(cell, None))
            .collect();

        if cells.len() < rule.min_cells {
            debug!(row = index, cells = cells.len(), "skipping short row");
            continue;
        }

        let column = |idx: usize| cells.get(idx).cloned().unwrap_or_default();
        let title = column(rule.title_index);
        let total_gross = column(rule.gross_index);
        if title.is_empty() || total_gross.is_empty() {
            debug!(row = index, "skipping row without title or gross");
            continue;
        }

        records.push(BoxOfficeRecord {
            title,
            total_gross,
            release_date: column(rule.release_date_index),
            distributor: column(rule.distributor_index),
            pulled_at,
        });
    }

    Ok(records)
}

/// Returns the link of the first search result row, if the page has one.
pub fn first_search_result_link(html: &str, rule: &SearchRule) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let row_selector = parse_selector(&rule.result_selector)?;
    let link_selector = parse_selector(&rule.link_selector)?;

    let Some(row) = document.select(&row_selector).next() else {
        return Ok(None);
    };

    let link = row
        .select(&link_selector)
        .next()
        .map(|el| element_attr_or_text(el, Some(rule.link_attr.as_str())))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());
    Ok(link)
}

/// Reads the critic score out of the JSON block embedded in a detail page.
///
/// A missing block, malformed JSON and a missing, null, blank or non-scalar
/// field all come back as `None`.
pub fn extract_score(html: &str, rule: &ScoreRule) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&rule.script_selector).ok()?;
    let block = document.select(&selector).next()?;
    let text = block.text().collect::<String>();

    let payload: Value = match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "score block is not valid json");
            return None;
        }
    };

    select_json_value(&payload, &rule.json_path).and_then(json_value_to_string)
}

/// Parses the editorial "best new movies" countdown into title/score pairs.
pub fn parse_guide(html: &str, rule: &GuideRule) -> Result<Vec<GuideEntry>> {
    let document = Html::parse_document(html);
    let item_selector = parse_selector(&rule.item_selector)?;
    let title_selector = parse_selector(&rule.title_selector)?;
    let score_selector = parse_selector(&rule.score_selector)?;

    let mut entries = Vec::new();
    for item in document.select(&item_selector) {
        let title = first_text(item, &title_selector);
        let score = first_text(item, &score_selector);
        if let (Some(title), Some(score)) = (title, score) {
            entries.push(GuideEntry { title, score });
        }
    }
    Ok(entries)
}

/// Resolves `value` against `base_url` unless it is already absolute.
pub fn absolutize_url(base_url: &str, value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }

    if let Ok(base) = Url::parse(base_url)
        && let Ok(joined) = base.join(value)
    {
        return joined.to_string();
    }

    format!("{}{}", base_url.trim_end_matches('/'), value)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| anyhow!("invalid selector {selector}: {err:?}"))
}

fn first_text(node: ElementRef<'_>, selector: &Selector) -> Option<String> {
    node.select(selector)
        .next()
        .map(|el| element_attr_or_text(el, None))
        .filter(|text| !text.is_empty())
}

fn element_attr_or_text(element: ElementRef<'_>, attr: Option<&str>) -> String {
    if let Some(attr) = attr {
        return element
            .value()
            .attr(attr)
            .map(ToString::to_string)
            .unwrap_or_default();
    }

    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
enum JsonToken<'a> {
    Key(&'a str),
    Index(&'a str, usize),
}

fn json_path_tokens(path: &str) -> Vec<JsonToken<'_>> {
    let trimmed = path.trim();
    let stripped = trimmed.strip_prefix("$.").unwrap_or(trimmed);
    stripped
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            if let Some((key, idx_part)) = part.split_once('[')
                && let Some(idx_str) = idx_part.strip_suffix(']')
                && let Ok(idx) = idx_str.parse::<usize>()
            {
                return JsonToken::Index(key, idx);
            }
            JsonToken::Key(part)
        })
        .collect()
}

fn select_json_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for token in json_path_tokens(path) {
        current = match token {
            JsonToken::Key(key) => current.get(key)?,
            JsonToken::Index(key, idx) => {
                let container = if key.is_empty() {
                    current
                } else {
                    current.get(key)?
                };
                container.get(idx)?
            }
        };
    }
    Some(current)
}

fn json_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(v) => Some(v.to_string()),
        Value::Null | Value::String(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_path_accepts_optional_root_prefix() {
        let payload: Value =
            serde_json::from_str(r#"{"criticsScore":{"scorePercent":"87%"},"list":[1,2]}"#)
                .unwrap();
        assert_eq!(
            select_json_value(&payload, "$.criticsScore.scorePercent"),
            select_json_value(&payload, "criticsScore.scorePercent"),
        );
        assert_eq!(
            select_json_value(&payload, "list[1]").and_then(json_value_to_string),
            Some("2".to_string())
        );
        assert!(select_json_value(&payload, "criticsScore.missing").is_none());
    }

    #[test]
    fn relative_links_join_the_base_origin() {
        assert_eq!(
            absolutize_url("https://www.rottentomatoes.com", "/m/dune"),
            "https://www.rottentomatoes.com/m/dune"
        );
        assert_eq!(
            absolutize_url("https://www.rottentomatoes.com", "https://other.example/m/x"),
            "https://other.example/m/x"
        );
    }
}
