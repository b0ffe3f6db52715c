//! Web search collaborator.
//!
//! The pipeline only needs an ordered list of result URLs per query; the
//! [`SearchProvider`] trait keeps it independent of any concrete engine so
//! tests can substitute a deterministic one.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use scraper::{Html, Selector};

use crate::data_models::SearchHit;
use crate::error::{ResearchError, Result};

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0";

pub trait SearchProvider: Send + Sync {
    /// Return at most `count` hits for `query`, best first.
    fn search(&self, query: &str, count: usize)
    -> impl Future<Output = Result<Vec<SearchHit>>> + Send;
}

/// Scrapes DuckDuckGo's JavaScript-free HTML endpoint.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Result<DuckDuckGoSearch> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ResearchError::Http(format!("failed to build search client: {e}")))?;
        Ok(DuckDuckGoSearch { client })
    }

    /// DuckDuckGo wraps result links as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
    fn extract_url(href: &str) -> Option<String> {
        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_string()
        };

        let parsed = Url::parse(&full_href).ok()?;
        if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        } else {
            Some(full_href)
        }
    }
}

impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchHit>> {
        tracing::debug!(query, count, "DuckDuckGo search");

        let html = self
            .client
            .post(DDG_HTML_ENDPOINT)
            .form(&[("q", query)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| ResearchError::Search(format!("DuckDuckGo request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ResearchError::Search(format!("DuckDuckGo HTTP error: {e}")))?
            .text()
            .await
            .map_err(|e| ResearchError::Search(format!("DuckDuckGo response read failed: {e}")))?;

        parse_duckduckgo_html(&html, count)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| ResearchError::Search(format!("invalid selector {css:?}: {e:?}")))
}

/// Parse DuckDuckGo's HTML result page, skipping ads and entries without a link.
pub fn parse_duckduckgo_html(html: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let result_sel = selector(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for element in document.select(&result_sel) {
        if hits.len() >= max_results {
            break;
        }
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };
        let Some(url) = title_el
            .value()
            .attr("href")
            .and_then(DuckDuckGoSearch::extract_url)
        else {
            continue;
        };

        let title = title_el.text().collect::<String>().trim().to_string();
        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        hits.push(SearchHit {
            url,
            title,
            snippet,
        });
    }

    tracing::debug!(count = hits.len(), "DuckDuckGo results parsed");
    Ok(hits)
}
