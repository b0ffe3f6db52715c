use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::Html;
use axum::routing::get;

use gleaner::fetcher::{HttpFetcher, MAX_BODY_BYTES, PageFetcher};

mod test_helpers {
    use super::*;

    const ARTICLE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Announcing LangSmith</title>
    <style>body { font-family: sans-serif; }</style>
    <script>window.analytics = {};</script>
</head>
<body>
    <h1>Announcing   LangSmith</h1>
    <p>
        A unified platform for debugging,
        testing, and monitoring LLM applications.
    </p>
    <ul><li>Tracing</li><li>Evaluation</li></ul>
</body>
</html>"#;

    fn router() -> Router {
        Router::new()
            .route("/article", get(|| async { Html(ARTICLE) }))
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, "no such page") }),
            )
            .route(
                "/broken",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/plain",
                get(|| async {
                    (
                        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                        "  plain\n\ntext   body \t",
                    )
                }),
            )
            .route(
                "/huge",
                get(|| async { "a".repeat(3 * MAX_BODY_BYTES) }),
            )
            .route(
                "/huge-html",
                get(|| async {
                    Html(format!("<p>{}</p><p>END</p>", "x".repeat(3 * MAX_BODY_BYTES)))
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Html("<p>too late</p>")
                }),
            )
    }

    pub async fn spawn_server() -> Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, router()).await.unwrap();
        });
        Ok(addr)
    }

    /// An address nothing is listening on.
    pub async fn dead_addr() -> Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);
        Ok(addr)
    }

    pub fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(2)).unwrap()
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_fetch_extracts_visible_text() -> Result<()> {
    let addr = spawn_server().await?;
    let text = fetcher().fetch(&format!("http://{addr}/article")).await;

    assert_eq!(
        text,
        "Announcing LangSmith Announcing LangSmith A unified platform for debugging, \
         testing, and monitoring LLM applications. Tracing Evaluation"
    );
    Ok(())
}

#[tokio::test]
async fn test_fetch_not_found_names_status_code() -> Result<()> {
    let addr = spawn_server().await?;
    let text = fetcher().fetch(&format!("http://{addr}/missing")).await;

    assert_eq!(text, "Failed to retrieve the webpage: Status code 404");
    Ok(())
}

#[tokio::test]
async fn test_fetch_server_error_names_status_code() -> Result<()> {
    let addr = spawn_server().await?;
    let text = fetcher().fetch(&format!("http://{addr}/broken")).await;

    assert!(text.contains("500"), "got: {text}");
    assert!(!text.contains("boom"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_plain_text_is_collapsed() -> Result<()> {
    let addr = spawn_server().await?;
    let text = fetcher().fetch(&format!("http://{addr}/plain")).await;

    assert_eq!(text, "plain text body");
    Ok(())
}

#[tokio::test]
async fn test_fetch_timeout_becomes_text() -> Result<()> {
    let addr = spawn_server().await?;
    let fetcher = HttpFetcher::new(Duration::from_millis(200))?;
    let text = fetcher.fetch(&format!("http://{addr}/slow")).await;

    assert!(text.starts_with("Failed to retrieve the webpage: "), "got: {text}");
    Ok(())
}

#[tokio::test]
async fn test_fetch_connection_refused_becomes_text() -> Result<()> {
    let addr = dead_addr().await?;
    let text = fetcher().fetch(&format!("http://{addr}/")).await;

    assert!(text.starts_with("Failed to retrieve the webpage: "), "got: {text}");
    Ok(())
}

#[tokio::test]
async fn test_fetch_never_fails_on_garbage_urls() {
    let fetcher = fetcher();
    for url in ["", "not a url", "ftp://example.com/file", "http://"] {
        let text = fetcher.fetch(url).await;
        assert!(
            text.starts_with("Failed to retrieve the webpage: "),
            "{url:?} gave {text}"
        );
    }
}

#[tokio::test]
async fn test_fetch_caps_oversized_plain_body() -> Result<()> {
    let addr = spawn_server().await?;
    let text = fetcher().fetch(&format!("http://{addr}/huge")).await;

    assert_eq!(text.len(), MAX_BODY_BYTES);
    assert!(text.bytes().all(|b| b == b'a'));
    Ok(())
}

#[tokio::test]
async fn test_fetch_parses_only_the_capped_prefix_of_html() -> Result<()> {
    let addr = spawn_server().await?;
    let text = fetcher().fetch(&format!("http://{addr}/huge-html")).await;

    // the first MAX_BODY_BYTES bytes are "<p>" followed by x's
    assert_eq!(text.len(), MAX_BODY_BYTES - "<p>".len());
    assert!(!text.contains("END"));
    Ok(())
}
