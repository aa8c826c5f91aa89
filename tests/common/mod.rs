#![allow(dead_code)]

use movie_ranks::config::AppConfig;
use movie_ranks::fetch::{FetchError, PageFetcher};
use reqwest::StatusCode;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const BOX_OFFICE_URL: &str = "https://boxoffice.test/year/2025/";
pub const SCORE_BASE_URL: &str = "https://scores.test";
pub const SEARCH_TEMPLATE: &str = "https://scores.test/search?search={{query}}";
pub const GUIDE_URL: &str = "https://editorial.scores.test/guide/best-new-movies/";

/// Serves canned pages by exact URL; anything else is a 404.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    requested: RefCell<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn set_page(&mut self, url: &str, body: impl Into<String>) {
        self.pages.insert(url.to_string(), body.into());
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl PageFetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            })
    }
}

pub fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.db_path = root.join("db/movies.db");
    config.out_dir = root.join("out");
    config.request_delay_seconds = 0.0;
    config.sources.box_office_url = BOX_OFFICE_URL.to_string();
    config.sources.score_base_url = SCORE_BASE_URL.to_string();
    config.sources.search_url_template = SEARCH_TEMPLATE.to_string();
    config.sources.guide_url = GUIDE_URL.to_string();
    config
}

pub fn fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("fixture {}: {err}", path.display()))
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Builds a listing page with a header row and one 13-column row per movie.
pub fn box_office_page(movies: &[(&str, &str, &str, &str)]) -> String {
    let mut html = String::from(
        "<html><body><table>\
         <tr><th>Rank</th><th>Release</th><th>Genre</th><th>Budget</th><th>Running Time</th>\
         <th>Gross</th><th>Theaters</th><th>Total Gross</th><th>Open</th><th>Open Theaters</th>\
         <th>Release Date</th><th>Close</th><th>Distributor</th></tr>",
    );
    for (rank, (title, gross, release_date, distributor)) in movies.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{title}</td><td>Drama</td><td>-</td><td>180 min</td>\
             <td>{gross}</td><td>3,761</td><td>{gross}</td><td>$82M</td><td>3,610</td>\
             <td>{release_date}</td><td>-</td><td>{distributor}</td></tr>",
            rank + 1
        ));
    }
    html.push_str("</table></body></html>");
    html
}

pub fn search_page(links: &[&str]) -> String {
    let mut html = String::from("<html><body><search-page-result type=\"movie\"><ul>");
    for link in links {
        html.push_str(&format!(
            "<search-page-media-row><a href=\"{link}\" data-qa=\"thumbnail-link\"><img></a>\
             <a href=\"{link}\" data-qa=\"info-name\" slot=\"title\"> Movie </a>\
             </search-page-media-row>"
        ));
    }
    html.push_str("</ul></search-page-result></body></html>");
    html
}

pub fn detail_page(score_json: &str) -> String {
    format!(
        "<html><head><title>Movie</title></head><body>\
         <script id=\"media-scorecard-json\" data-json=\"mediaScorecard\" type=\"application/json\">{score_json}</script>\
         </body></html>"
    )
}

pub fn search_url(title: &str) -> String {
    movie_ranks::lookup::search_url(SEARCH_TEMPLATE, title)
}
