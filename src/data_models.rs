use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Question {
        Question { text: text.into() }
    }
}

/// A single result as returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// One unit of fan-out work: a page to summarize against the query that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub question: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub url: String,
    pub question: String,
    pub summary: String,
    /// Set when the summary is a placeholder for a failed model call.
    pub degraded: bool,
}

impl PageSummary {
    pub fn new(target: &SearchTarget, summary: String) -> PageSummary {
        PageSummary {
            url: target.url.clone(),
            question: target.question.clone(),
            summary,
            degraded: false,
        }
    }

    pub fn degraded(target: &SearchTarget, reason: String) -> PageSummary {
        PageSummary {
            degraded: true,
            ..PageSummary::new(target, reason)
        }
    }

    /// The form that goes into the research bundle.
    pub fn formatted(&self) -> String {
        format!("URL: {}\n\nSummary:\n\n{}", self.url, self.summary)
    }
}

/// Everything gathered for one expanded search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFindings {
    pub question: Question,
    pub summaries: Vec<PageSummary>,
    pub failure: Option<String>,
}

impl QueryFindings {
    pub fn gathered(question: Question, summaries: Vec<PageSummary>) -> QueryFindings {
        QueryFindings {
            question,
            summaries,
            failure: None,
        }
    }

    pub fn failed(question: Question, reason: String) -> QueryFindings {
        QueryFindings {
            question,
            summaries: vec![],
            failure: Some(reason),
        }
    }

    /// Text entries this group contributes to the research bundle.
    pub fn texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self.summaries.iter().map(PageSummary::formatted).collect();
        if let Some(reason) = &self.failure {
            texts.push(format!(
                "Search failed for query \"{}\": {}",
                self.question.text, reason
            ));
        }
        texts
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub question: String,
    pub queries: Vec<Question>,
    pub sources: Vec<String>,
    pub markdown: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> SearchTarget {
        SearchTarget {
            question: "what is rust".into(),
            url: "https://www.rust-lang.org/".into(),
        }
    }

    #[test]
    fn formatted_summary_layout() {
        let summary = PageSummary::new(&target(), "A systems language.".into());
        assert_eq!(
            summary.formatted(),
            "URL: https://www.rust-lang.org/\n\nSummary:\n\nA systems language."
        );
    }

    #[test]
    fn degraded_summary_keeps_target() {
        let summary = PageSummary::degraded(&target(), "model down".into());
        assert!(summary.degraded);
        assert_eq!(summary.url, "https://www.rust-lang.org/");
        assert_eq!(summary.question, "what is rust");
        assert_eq!(summary.summary, "model down");
    }

    #[test]
    fn failed_findings_contribute_a_note() {
        let findings = QueryFindings::failed(Question::new("rust vs go"), "timeout".into());
        assert_eq!(
            findings.texts(),
            vec!["Search failed for query \"rust vs go\": timeout".to_string()]
        );
    }
}
