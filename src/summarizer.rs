use crate::data_models::{PageSummary, SearchTarget};
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::llm::{CompletionModel, Prompt};

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_summary_prompt(text: &str, question: &str) -> Prompt {
    Prompt::user(format!(
        "{text}\n\n\
         ---------------------------\n\
         Using the above text, answer in short the following question:\n\n\
         > {question}\n\
         ---------------------------\n\
         If the question cannot be answered using the text, simply summarize the text. \
         Include all factual information, numbers, stats, etc."
    ))
}

/// Fetches a page and asks the model to answer the query from its text alone.
pub struct PageSummarizer<'a, M, F> {
    model: &'a M,
    fetcher: &'a F,
    max_page_chars: usize,
}

impl<'a, M, F> PageSummarizer<'a, M, F>
where
    M: CompletionModel,
    F: PageFetcher,
{
    pub fn new(model: &'a M, fetcher: &'a F, max_page_chars: usize) -> Self {
        Self {
            model,
            fetcher,
            max_page_chars,
        }
    }

    pub async fn summarize(&self, target: &SearchTarget) -> Result<PageSummary> {
        let page = self.fetcher.fetch(&target.url).await;
        let text = truncate_chars(&page, self.max_page_chars);
        tracing::debug!(url = %target.url, chars = text.chars().count(), "summarizing page");

        let prompt = build_summary_prompt(text, &target.question);
        let summary = self.model.complete(&prompt).await?;
        Ok(PageSummary::new(target, summary))
    }
}

#[test]
fn test_truncate_chars() {
    assert_eq!(truncate_chars("hello", 10), "hello");
    assert_eq!(truncate_chars("hello", 5), "hello");
    assert_eq!(truncate_chars("hello", 3), "hel");
    assert_eq!(truncate_chars("hello", 0), "");
    assert_eq!(truncate_chars("", 3), "");
}

#[test]
fn test_truncate_chars_respects_multibyte() {
    let text = "héllo wörld";
    assert_eq!(truncate_chars(text, 2), "hé");
    assert_eq!(truncate_chars(text, 8), "héllo wö");

    let cjk = "日本語のテキスト";
    assert_eq!(truncate_chars(cjk, 3), "日本語");
}

#[test]
fn test_summary_prompt_layout() {
    let prompt = build_summary_prompt("Page text.", "What is LangSmith?");
    assert!(prompt.system.is_none());
    assert!(prompt.user.starts_with("Page text.\n\n---------------------------\n"));
    assert!(prompt.user.contains("> What is LangSmith?\n"));
    assert!(prompt.user.contains("Include all factual information, numbers, stats"));
}
