use crate::config::{AppConfig, QUERY_PLACEHOLDER};
use crate::fetch::PageFetcher;
use crate::model::Lookup;
use crate::parser::{absolutize_url, extract_score, first_search_result_link};
use anyhow::Result;
use tracing::debug;
use url::form_urlencoded;

pub fn search_url(template: &str, title: &str) -> String {
    let query: String = form_urlencoded::byte_serialize(title.as_bytes()).collect();
    template.replace(QUERY_PLACEHOLDER, &query)
}

/// Searches the score site for `title` and resolves the first hit to an
/// absolute detail-page URL.
///
/// `Err` is reserved for a broken search rule; an empty result page is
/// `Lookup::NotFound`.
pub fn find_detail_url(
    fetcher: &dyn PageFetcher,
    config: &AppConfig,
    title: &str,
) -> Result<Lookup<String>> {
    let url = search_url(&config.sources.search_url_template, title);
    let html = match fetcher.fetch(&url) {
        Ok(html) => html,
        Err(err) => return Ok(Lookup::TransientError(err)),
    };

    let link = first_search_result_link(&html, &config.search)?;
    let resolved = link.map(|href| absolutize_url(&config.sources.score_base_url, &href));
    debug!(%title, search = %url, detail = ?resolved, "search resolved");
    Ok(resolved.into())
}

/// Runs search, detail fetch and score extraction for one title.
pub fn lookup_score(
    fetcher: &dyn PageFetcher,
    config: &AppConfig,
    title: &str,
) -> Result<Lookup<String>> {
    let detail_url = match find_detail_url(fetcher, config, title)? {
        Lookup::Found(url) => url,
        Lookup::NotFound => return Ok(Lookup::NotFound),
        Lookup::TransientError(err) => return Ok(Lookup::TransientError(err)),
    };

    let html = match fetcher.fetch(&detail_url) {
        Ok(html) => html,
        Err(err) => return Ok(Lookup::TransientError(err)),
    };

    Ok(extract_score(&html, &config.score).into())
}
