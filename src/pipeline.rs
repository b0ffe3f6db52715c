use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use nanoid::nanoid;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::aggregator::ResearchBundle;
use crate::config::{FailurePolicy, ResearchSettings};
use crate::data_models::{QueryFindings, Question, Report};
use crate::error::Result;
use crate::fan_out::WebSearchFanOut;
use crate::fetcher::PageFetcher;
use crate::llm::CompletionModel;
use crate::query_expander::QueryExpander;
use crate::search::SearchProvider;
use crate::summarizer::PageSummarizer;
use crate::synthesizer::ReportSynthesizer;

/// Runs the whole research job: expand, search and summarize, collapse, write.
///
/// ```text
///     question
///       -> expand into N search queries
///       -> per query: search M urls -> summarize each page     (N x M, concurrent)
///       -> collapse summaries into one research bundle
///       -> synthesize report
/// ```
pub struct Researcher<M, S, F> {
    model: M,
    search: S,
    fetcher: F,
    settings: ResearchSettings,
}

impl<M, S, F> Researcher<M, S, F>
where
    M: CompletionModel,
    S: SearchProvider,
    F: PageFetcher,
{
    pub fn new(model: M, search: S, fetcher: F, settings: ResearchSettings) -> Self {
        Self {
            model,
            search,
            fetcher,
            settings,
        }
    }

    pub async fn run(&self, question: &str) -> Result<Report> {
        let span = tracing::info_span!("research", run_id = %nanoid!(8));
        self.run_inner(Question::new(question)).instrument(span).await
    }

    async fn run_inner(&self, question: Question) -> Result<Report> {
        tracing::info!(question = %question.text, "starting research");
        let policy = self.settings.failure_policy;

        let expander =
            QueryExpander::new(&self.model, self.settings.queries_per_question, policy);
        let queries = expander.expand(&question).await?;

        let findings = self.gather_all(&queries).await?;
        let bundle = ResearchBundle::from_findings(&findings);

        let synthesizer = ReportSynthesizer::new(&self.model, self.settings.min_report_words);
        let markdown = synthesizer.write_report(&question.text, &bundle).await?;
        tracing::info!(words = markdown.split_whitespace().count(), "report written");

        Ok(Report {
            question: question.text,
            queries,
            sources: bundle.sources,
            markdown,
            generated_at: Utc::now(),
        })
    }

    /// Fan every query out through search and summarization, keeping query order.
    pub async fn gather_all(&self, queries: &[Question]) -> Result<Vec<QueryFindings>> {
        let page_permits = Arc::new(Semaphore::new(self.settings.max_in_flight_pages.max(1)));
        let summarizer =
            PageSummarizer::new(&self.model, &self.fetcher, self.settings.max_page_chars);
        let fan_out = WebSearchFanOut::new(
            &self.search,
            summarizer,
            self.settings.results_per_query,
            self.settings.page_concurrency,
            page_permits,
            self.settings.failure_policy,
        );

        let fan_out = &fan_out;
        stream::iter(queries.iter().cloned().map(move |query| async move {
            match fan_out.search_and_gather(&query).await {
                Ok(summaries) => Ok(QueryFindings::gathered(query, summaries)),
                Err(e) if self.settings.failure_policy == FailurePolicy::Isolate => {
                    tracing::warn!(query = %query.text, error = %e, "search failed");
                    Ok(QueryFindings::failed(query, e.to_string()))
                }
                Err(e) => Err(e),
            }
        }))
        .buffered(self.settings.query_concurrency.max(1))
        .try_collect()
        .await
    }
}
