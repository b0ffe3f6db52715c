use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::error::ResearchError;
use crate::extractor::{TextExtractor, collapse_whitespace};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Bytes of a response body read before the rest is discarded. The summarizer
/// only keeps the first few thousand characters, and parse time grows with
/// both size and nesting depth.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Turns a URL into text for the summarizer.
///
/// Implementations never fail: anything that goes wrong is described in the
/// returned text, which then flows downstream like ordinary page content.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = String> + Send;
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("Status code {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0:#}")]
    Extract(anyhow::Error),
}

pub struct HttpFetcher {
    client: reqwest::Client,
    extractor: TextExtractor,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<HttpFetcher, ResearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ResearchError::Http(format!("failed to build fetch client: {e}")))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> HttpFetcher {
        HttpFetcher {
            client,
            extractor: TextExtractor,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let is_html = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);

        let body = read_capped(res, MAX_BODY_BYTES).await?;
        let body = String::from_utf8_lossy(&body);
        if is_html {
            self.extractor.extract(&body).map_err(FetchError::Extract)
        } else {
            Ok(collapse_whitespace(&body))
        }
    }
}

/// Read at most `limit` bytes of the body, dropping the connection after that.
async fn read_capped(mut res: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    while let Some(chunk) = res.chunk().await? {
        if push_capped(&mut body, &chunk, limit) {
            log::debug!("body of {} truncated at {limit} bytes", res.url());
            break;
        }
    }
    Ok(body)
}

/// Append as much of `chunk` as fits under `limit`; true once the limit is hit.
fn push_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() >= limit
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> String {
        match self.fetch_page(url).await {
            Ok(text) => {
                log::debug!("fetched {url} ({} chars)", text.chars().count());
                text
            }
            Err(e) => {
                log::warn!("error fetching page {url}, error: {e}");
                format!("Failed to retrieve the webpage: {e}")
            }
        }
    }
}

#[test]
fn test_status_error_names_the_code() {
    let err = FetchError::Status(503);
    assert_eq!(
        format!("Failed to retrieve the webpage: {err}"),
        "Failed to retrieve the webpage: Status code 503"
    );
}

#[test]
fn test_push_capped_stops_at_limit() {
    let mut body = Vec::new();
    assert!(!push_capped(&mut body, b"abc", 5));
    assert!(push_capped(&mut body, b"defgh", 5));
    assert_eq!(body, b"abcde");
    assert!(push_capped(&mut body, b"ij", 5));
    assert_eq!(body, b"abcde");
}
