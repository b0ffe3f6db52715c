use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::FailurePolicy;
use crate::data_models::Question;
use crate::error::{ResearchError, Result};
use crate::llm::{CompletionModel, Prompt};

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("quoted string pattern is valid"));

pub fn build_query_prompt(question: &str, count: usize) -> Prompt {
    let format = (1..=count)
        .map(|i| format!("[\"query{i}\"]"))
        .collect::<Vec<_>>()
        .join(", ");
    Prompt::user(format!(
        "Write {count} google search queries to search online that form an objective \
         opinion from the following: {question}\n\
         You must respond with a list of strings in the following format:\n\
         [{format}]"
    ))
}

/// Strip a surrounding markdown code fence, if the model added one.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the expected `[["q1"], ["q2"], ["q3"]]` shape.
///
/// Anything else is rejected: the completion is untrusted input.
pub fn parse_queries(raw: &str) -> Result<Vec<Question>> {
    let body = strip_code_fence(raw);
    let lists: Vec<Vec<String>> = serde_json::from_str(body)
        .map_err(|e| ResearchError::MalformedQueries(format!("{e} in {body:?}")))?;

    if lists.is_empty() {
        return Err(ResearchError::MalformedQueries("empty query list".into()));
    }

    lists
        .into_iter()
        .enumerate()
        .map(|(i, list)| match list.as_slice() {
            [query] if !query.trim().is_empty() => Ok(Question::new(query.trim())),
            _ => Err(ResearchError::MalformedQueries(format!(
                "entry {i} must hold exactly one non-empty query, got {list:?}"
            ))),
        })
        .collect()
}

/// Best-effort recovery: every non-empty quoted string is taken as a query.
pub fn salvage_queries(raw: &str) -> Vec<Question> {
    QUOTED
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().replace("\\\"", "\"").trim().to_string())
        .filter(|q| !q.is_empty())
        .map(Question::new)
        .collect()
}

/// Asks the model to rewrite one question into a handful of search queries.
pub struct QueryExpander<'a, M> {
    model: &'a M,
    query_count: usize,
    policy: FailurePolicy,
}

impl<'a, M: CompletionModel> QueryExpander<'a, M> {
    pub fn new(model: &'a M, query_count: usize, policy: FailurePolicy) -> Self {
        Self {
            model,
            query_count: query_count.max(1),
            policy,
        }
    }

    pub async fn expand(&self, question: &Question) -> Result<Vec<Question>> {
        let prompt = build_query_prompt(&question.text, self.query_count);
        let raw = match self.model.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) if self.policy == FailurePolicy::Isolate => {
                tracing::warn!(error = %e, "query expansion failed, searching the question itself");
                return Ok(vec![question.clone()]);
            }
            Err(e) => return Err(e),
        };

        let mut queries = match parse_queries(&raw) {
            Ok(queries) => queries,
            Err(e) if self.policy == FailurePolicy::Isolate => {
                tracing::warn!(error = %e, "salvaging queries from malformed completion");
                let salvaged = salvage_queries(&raw);
                if salvaged.is_empty() {
                    vec![question.clone()]
                } else {
                    salvaged
                }
            }
            Err(e) => return Err(e),
        };

        queries.truncate(self.query_count);
        tracing::info!(count = queries.len(), "expanded question into search queries");
        Ok(queries)
    }
}
