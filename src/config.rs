use anyhow::{Context, Result, anyhow, bail};
use scraper::Selector;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

pub const QUERY_PLACEHOLDER: &str = "{{query}}";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_delay_seconds")]
    pub request_delay_seconds: f64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_export_delimiter")]
    pub export_delimiter: char,
    #[serde(default)]
    pub box_office_history: BoxOfficeHistory,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub box_office: BoxOfficeRule,
    #[serde(default)]
    pub search: SearchRule,
    #[serde(default)]
    pub score: ScoreRule,
    #[serde(default)]
    pub guide: GuideRule,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            out_dir: default_out_dir(),
            user_agent: default_user_agent(),
            request_delay_seconds: default_request_delay_seconds(),
            timeout_secs: None,
            export_delimiter: default_export_delimiter(),
            box_office_history: BoxOfficeHistory::default(),
            sources: SourcesConfig::default(),
            box_office: BoxOfficeRule::default(),
            search: SearchRule::default(),
            score: ScoreRule::default(),
            guide: GuideRule::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            bail!("user_agent must not be empty");
        }
        if !self.request_delay_seconds.is_finite() || self.request_delay_seconds < 0.0 {
            bail!(
                "request_delay_seconds must be a non-negative number, got {}",
                self.request_delay_seconds
            );
        }
        if !self.export_delimiter.is_ascii() {
            bail!("export_delimiter must be a single ascii character");
        }

        for (name, value) in [
            ("sources.box_office_url", &self.sources.box_office_url),
            ("sources.score_base_url", &self.sources.score_base_url),
            ("sources.guide_url", &self.sources.guide_url),
        ] {
            Url::parse(value).with_context(|| format!("{name} is not a valid url: {value}"))?;
        }

        let template = &self.sources.search_url_template;
        if !template.contains(QUERY_PLACEHOLDER) {
            bail!("sources.search_url_template must contain {QUERY_PLACEHOLDER}");
        }
        Url::parse(&template.replace(QUERY_PLACEHOLDER, "title"))
            .with_context(|| format!("sources.search_url_template is not a valid url: {template}"))?;

        if self.box_office.min_cells == 0 {
            bail!("box_office.min_cells must be at least 1");
        }

        for (name, selector) in [
            ("box_office.row_selector", &self.box_office.row_selector),
            ("box_office.cell_selector", &self.box_office.cell_selector),
            ("search.result_selector", &self.search.result_selector),
            ("search.link_selector", &self.search.link_selector),
            ("score.script_selector", &self.score.script_selector),
            ("guide.item_selector", &self.guide.item_selector),
            ("guide.title_selector", &self.guide.title_selector),
            ("guide.score_selector", &self.guide.score_selector),
        ] {
            check_selector(name, selector)?;
        }

        if self.score.json_path.trim().trim_start_matches("$.").is_empty() {
            bail!("score.json_path must not be empty");
        }

        Ok(())
    }

    pub fn export_path(&self, file_name: &str) -> PathBuf {
        self.out_dir.join(file_name)
    }
}

/// How repeated scrapes land in the `box_office` table.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoxOfficeHistory {
    /// Every run appends; the table keeps the full history, duplicates included.
    #[default]
    Append,
    /// Rows already pulled today are replaced by the current run.
    ReplaceDay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_box_office_url")]
    pub box_office_url: String,
    #[serde(default = "default_score_base_url")]
    pub score_base_url: String,
    #[serde(default = "default_search_url_template")]
    pub search_url_template: String,
    #[serde(default = "default_guide_url")]
    pub guide_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            box_office_url: default_box_office_url(),
            score_base_url: default_score_base_url(),
            search_url_template: default_search_url_template(),
            guide_url: default_guide_url(),
        }
    }
}

/// Positional extraction of the box-office listing table.
///
/// The column indices follow the live page layout and are expected to drift;
/// adjusting them is a config change.
#[derive(Debug, Clone, Deserialize)]
pub struct BoxOfficeRule {
    #[serde(default = "default_row_selector")]
    pub row_selector: String,
    #[serde(default = "default_cell_selector")]
    pub cell_selector: String,
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    #[serde(default = "default_min_cells")]
    pub min_cells: usize,
    #[serde(default = "default_title_index")]
    pub title_index: usize,
    #[serde(default = "default_gross_index")]
    pub gross_index: usize,
    #[serde(default = "default_release_date_index")]
    pub release_date_index: usize,
    #[serde(default = "default_distributor_index")]
    pub distributor_index: usize,
}

impl Default for BoxOfficeRule {
    fn default() -> Self {
        Self {
            row_selector: default_row_selector(),
            cell_selector: default_cell_selector(),
            header_rows: default_header_rows(),
            min_cells: default_min_cells(),
            title_index: default_title_index(),
            gross_index: default_gross_index(),
            release_date_index: default_release_date_index(),
            distributor_index: default_distributor_index(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRule {
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
}

impl Default for SearchRule {
    fn default() -> Self {
        Self {
            result_selector: default_result_selector(),
            link_selector: default_link_selector(),
            link_attr: default_link_attr(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRule {
    #[serde(default = "default_script_selector")]
    pub script_selector: String,
    #[serde(default = "default_json_path")]
    pub json_path: String,
}

impl Default for ScoreRule {
    fn default() -> Self {
        Self {
            script_selector: default_script_selector(),
            json_path: default_json_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuideRule {
    #[serde(default = "default_guide_item_selector")]
    pub item_selector: String,
    #[serde(default = "default_guide_title_selector")]
    pub title_selector: String,
    #[serde(default = "default_guide_score_selector")]
    pub score_selector: String,
}

impl Default for GuideRule {
    fn default() -> Self {
        Self {
            item_selector: default_guide_item_selector(),
            title_selector: default_guide_title_selector(),
            score_selector: default_guide_score_selector(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config: AppConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse toml in {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

/// Loads `path` when it exists, otherwise falls back to the built-in defaults.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        info!(config = %path.display(), "config file not found; using built-in defaults");
        let config = AppConfig::default();
        config.validate()?;
        return Ok(config);
    }
    load_config(path)
}

fn check_selector(name: &str, selector: &str) -> Result<()> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|err| anyhow!("invalid {name} {selector}: {err:?}"))
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/movies.db")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("data/out")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_request_delay_seconds() -> f64 {
    1.0
}

fn default_export_delimiter() -> char {
    ','
}

fn default_box_office_url() -> String {
    "https://www.boxofficemojo.com/year/".to_string()
}

fn default_score_base_url() -> String {
    "https://www.rottentomatoes.com".to_string()
}

fn default_search_url_template() -> String {
    format!("https://www.rottentomatoes.com/search?search={QUERY_PLACEHOLDER}")
}

fn default_guide_url() -> String {
    "https://editorial.rottentomatoes.com/guide/best-new-movies/".to_string()
}

fn default_row_selector() -> String {
    "table tr".to_string()
}

fn default_cell_selector() -> String {
    "td".to_string()
}

fn default_header_rows() -> usize {
    1
}

fn default_min_cells() -> usize {
    8
}

fn default_title_index() -> usize {
    1
}

fn default_gross_index() -> usize {
    5
}

fn default_release_date_index() -> usize {
    10
}

fn default_distributor_index() -> usize {
    12
}

fn default_result_selector() -> String {
    "search-page-media-row".to_string()
}

fn default_link_selector() -> String {
    "a[data-qa=\"info-name\"]".to_string()
}

fn default_link_attr() -> String {
    "href".to_string()
}

fn default_script_selector() -> String {
    "script#media-scorecard-json[type=\"application/json\"]".to_string()
}

fn default_json_path() -> String {
    "criticsScore.scorePercent".to_string()
}

fn default_guide_item_selector() -> String {
    "div.row.countdown-item".to_string()
}

fn default_guide_title_selector() -> String {
    "div.col-sm-20.col-full-xs > div > h2 > a".to_string()
}

fn default_guide_score_selector() -> String {
    "div.countdown-item-content span.tMeterScore".to_string()
}
