use std::collections::HashSet;

use crate::data_models::QueryFindings;

pub const SEPARATOR: &str = "\n\n";

/// Flatten per-query groups of summaries into one block of text.
///
/// Items inside a group and the groups themselves are both joined with a blank
/// line, so `[["s1", "s2"], ["s3"]]` becomes `"s1\n\ns2\n\ns3"`.
pub fn collapse<S: AsRef<str>>(groups: &[Vec<S>]) -> String {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join(SEPARATOR)
        })
        .collect::<Vec<String>>()
        .join(SEPARATOR)
}

/// The research text handed to the synthesizer together with its sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchBundle {
    pub text: String,
    /// Distinct URLs in first-seen order. Degraded summaries are not sources.
    pub sources: Vec<String>,
}

impl ResearchBundle {
    pub fn from_findings(findings: &[QueryFindings]) -> ResearchBundle {
        let groups: Vec<Vec<String>> = findings.iter().map(QueryFindings::texts).collect();

        let mut seen = HashSet::new();
        let sources = findings
            .iter()
            .flat_map(|f| f.summaries.iter())
            .filter(|s| !s.degraded)
            .filter(|s| seen.insert(s.url.clone()))
            .map(|s| s.url.clone())
            .collect();

        ResearchBundle {
            text: collapse(&groups),
            sources,
        }
    }
}
