use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::Semaphore;

use crate::config::FailurePolicy;
use crate::data_models::{PageSummary, Question, SearchTarget};
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::llm::CompletionModel;
use crate::search::SearchProvider;
use crate::summarizer::PageSummarizer;

/// Searches one query and summarizes every result page against it.
///
/// Pages are summarized concurrently, at most `concurrency` at a time for this
/// query and at most as many as `page_permits` allows across the whole run.
/// Summaries come back in the order the search provider ranked the URLs.
pub struct WebSearchFanOut<'a, M, S, F> {
    search: &'a S,
    summarizer: PageSummarizer<'a, M, F>,
    results_per_query: usize,
    concurrency: usize,
    page_permits: Arc<Semaphore>,
    policy: FailurePolicy,
}

impl<'a, M, S, F> WebSearchFanOut<'a, M, S, F>
where
    M: CompletionModel,
    S: SearchProvider,
    F: PageFetcher,
{
    pub fn new(
        search: &'a S,
        summarizer: PageSummarizer<'a, M, F>,
        results_per_query: usize,
        concurrency: usize,
        page_permits: Arc<Semaphore>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            search,
            summarizer,
            results_per_query,
            concurrency: concurrency.max(1),
            page_permits,
            policy,
        }
    }

    pub async fn search_and_gather(&self, question: &Question) -> Result<Vec<PageSummary>> {
        let hits = self
            .search
            .search(&question.text, self.results_per_query)
            .await?;

        let targets: Vec<SearchTarget> = hits
            .into_iter()
            .take(self.results_per_query)
            .map(|hit| SearchTarget {
                question: question.text.clone(),
                url: hit.url,
            })
            .collect();
        tracing::info!(query = %question.text, urls = targets.len(), "gathering search results");

        stream::iter(targets.iter().map(|target| self.summarize_unit(target)))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    async fn summarize_unit(&self, target: &SearchTarget) -> Result<PageSummary> {
        // the semaphore is owned by the run and never closed
        let _permit = self.page_permits.acquire().await.ok();

        match self.summarizer.summarize(target).await {
            Ok(summary) => Ok(summary),
            Err(e) if self.policy == FailurePolicy::Isolate => {
                tracing::warn!(url = %target.url, error = %e, "summarization failed");
                Ok(PageSummary::degraded(
                    target,
                    format!("Failed to summarize the webpage: {e}"),
                ))
            }
            Err(e) => Err(e),
        }
    }
}
