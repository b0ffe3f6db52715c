use crate::aggregator::ResearchBundle;
use crate::error::Result;
use crate::llm::{CompletionModel, Prompt};

pub const SYSTEM_PROMPT: &str = "You are an AI critical thinker research assistant. \
Your sole purpose is to write well written, critically acclaimed, objective and structured \
reports on given text.";

pub fn build_report_prompt(question: &str, bundle: &ResearchBundle, min_words: usize) -> Prompt {
    let sources = if bundle.sources.is_empty() {
        "(no sources could be retrieved)".to_string()
    } else {
        bundle
            .sources
            .iter()
            .map(|url| format!("- {url}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let user = format!(
        "Information:\n\
         --------\n\
         {research}\n\
         --------\n\
         Sources:\n\
         {sources}\n\
         --------\n\
         Using the above information, answer the following question or topic: \"{question}\" \
         in a detailed report -- The report should focus on the answer to the question, should be \
         well structured, informative, in depth, with facts and numbers if available and a minimum \
         of {min_words} words.\n\
         You should strive to write the report as long as you can using all relevant and necessary \
         information provided.\n\
         You must write the report with markdown syntax, using headings to structure it.\n\
         You MUST determine your own concrete and valid opinion based on the given information. \
         Do NOT deter to general and meaningless conclusions.\n\
         Write all used source urls at the end of the report under a \"Sources\" heading, and make \
         sure to not add duplicated sources, but only one reference for each.\n\
         You must write the report in apa format.",
        research = bundle.text,
    );

    Prompt::with_system(SYSTEM_PROMPT, user)
}

/// Turns the aggregated research into the final long-form report.
pub struct ReportSynthesizer<'a, M> {
    model: &'a M,
    min_words: usize,
}

impl<'a, M: CompletionModel> ReportSynthesizer<'a, M> {
    pub fn new(model: &'a M, min_words: usize) -> Self {
        Self { model, min_words }
    }

    /// One model call; the completion is returned as-is.
    pub async fn write_report(&self, question: &str, bundle: &ResearchBundle) -> Result<String> {
        let prompt = build_report_prompt(question, bundle, self.min_words);
        tracing::info!(
            research_chars = bundle.text.len(),
            sources = bundle.sources.len(),
            "writing report"
        );
        self.model.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> ResearchBundle {
        ResearchBundle {
            text: "URL: https://a.dev/\n\nSummary:\n\nA".into(),
            sources: vec!["https://a.dev/".into(), "https://b.dev/".into()],
        }
    }

    #[test]
    fn report_prompt_has_system_framing() {
        let prompt = build_report_prompt("Why Rust?", &bundle(), 1200);
        assert_eq!(prompt.system.as_deref(), Some(SYSTEM_PROMPT));
    }

    #[test]
    fn report_prompt_embeds_research_question_and_directives() {
        let prompt = build_report_prompt("Why Rust?", &bundle(), 1200);
        assert!(prompt.user.starts_with("Information:\n--------\nURL: https://a.dev/"));
        assert!(prompt.user.contains("\"Why Rust?\""));
        assert!(prompt.user.contains("a minimum of 1200 words"));
        assert!(prompt.user.contains("apa format"));
        assert!(prompt.user.contains("Sources:\n- https://a.dev/\n- https://b.dev/\n"));
    }

    #[test]
    fn report_prompt_without_sources() {
        let empty = ResearchBundle {
            text: String::new(),
            sources: vec![],
        };
        let prompt = build_report_prompt("Why Rust?", &empty, 800);
        assert!(prompt.user.contains("(no sources could be retrieved)"));
        assert!(prompt.user.contains("a minimum of 800 words"));
    }
}
