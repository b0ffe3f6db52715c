use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ResearchError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const RESULTS_PER_QUERY: usize = 3;
pub const QUERIES_PER_QUESTION: usize = 3;
pub const MAX_PAGE_CHARS: usize = 10_000;
pub const MIN_REPORT_WORDS: usize = 1_200;

/// What to do when a search, model call or query parse fails mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Replace the failed unit with placeholder text and keep going.
    #[default]
    Isolate,
    /// Abort the whole run on the first failure.
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "abort" | "strict" => Ok(FailurePolicy::Abort),
            other => Err(ResearchError::Config(format!(
                "unknown failure policy '{other}', expected 'isolate' or 'abort'"
            ))),
        }
    }
}

/// Knobs the pipeline itself cares about.
#[derive(Debug, Clone)]
pub struct ResearchSettings {
    pub queries_per_question: usize,
    pub results_per_query: usize,
    pub max_page_chars: usize,
    pub query_concurrency: usize,
    pub page_concurrency: usize,
    pub max_in_flight_pages: usize,
    pub min_report_words: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            queries_per_question: QUERIES_PER_QUESTION,
            results_per_query: RESULTS_PER_QUERY,
            max_page_chars: MAX_PAGE_CHARS,
            query_concurrency: QUERIES_PER_QUESTION,
            page_concurrency: RESULTS_PER_QUERY,
            max_in_flight_pages: 6,
            min_report_words: MIN_REPORT_WORDS,
            failure_policy: FailurePolicy::Isolate,
        }
    }
}

pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub fetch_timeout: Duration,
    pub model_timeout: Duration,
    /// Sampling temperature; `None` leaves it to the provider.
    pub temperature: Option<f32>,
    pub research: ResearchSettings,
}

impl Config {
    /// Read configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Config> {
        dotenv().ok();
        let defaults = ResearchSettings::default();

        let research = ResearchSettings {
            results_per_query: get_env_parsed("GLEANER_RESULTS_PER_QUERY", defaults.results_per_query)?,
            max_page_chars: get_env_parsed("GLEANER_MAX_PAGE_CHARS", defaults.max_page_chars)?,
            page_concurrency: get_env_parsed("GLEANER_PAGE_CONCURRENCY", defaults.page_concurrency)?,
            max_in_flight_pages: get_env_parsed(
                "GLEANER_MAX_IN_FLIGHT_PAGES",
                defaults.max_in_flight_pages,
            )?,
            min_report_words: get_env_parsed("GLEANER_MIN_REPORT_WORDS", defaults.min_report_words)?,
            failure_policy: get_env_parsed("GLEANER_FAILURE_POLICY", defaults.failure_policy)?,
            ..defaults
        };

        Ok(Config {
            api_key: get_env("OPENAI_API_KEY")?,
            base_url: get_env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            model: get_env_or_default("GLEANER_MODEL", DEFAULT_MODEL),
            fetch_timeout: Duration::from_secs(get_env_parsed("GLEANER_FETCH_TIMEOUT_SECS", 10)?),
            model_timeout: Duration::from_secs(get_env_parsed("GLEANER_MODEL_TIMEOUT_SECS", 120)?),
            temperature: get_env_optional("GLEANER_TEMPERATURE")?,
            research,
        })
    }

    pub fn research_settings(&self) -> ResearchSettings {
        self.research.clone()
    }
}

fn get_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| {
        ResearchError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_optional(key)?.unwrap_or(default))
}

fn get_env_optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_optional(key, env::var(key).ok())
}

fn parse_optional<T>(key: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) if !raw.trim().is_empty() => parse_value(key, &raw).map(Some),
        _ => Ok(None),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ResearchError::Config(format!("Invalid value for {key} ('{raw}'): {e}")))
}

#[test]
fn test_failure_policy_from_str() {
    assert_eq!("isolate".parse::<FailurePolicy>().unwrap(), FailurePolicy::Isolate);
    assert_eq!(" Abort ".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
    assert_eq!("strict".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
    assert!(matches!(
        "sometimes".parse::<FailurePolicy>(),
        Err(ResearchError::Config(_))
    ));
}

#[test]
fn test_parse_value() {
    assert_eq!(parse_value::<usize>("GLEANER_MAX_PAGE_CHARS", " 5000 ").unwrap(), 5000);

    let err = parse_value::<usize>("GLEANER_MAX_PAGE_CHARS", "lots").unwrap_err();
    assert!(matches!(err, ResearchError::Config(_)));
    assert!(err.to_string().starts_with("config error: "));
    assert!(err.to_string().contains("GLEANER_MAX_PAGE_CHARS"));
    assert!(err.to_string().contains("lots"));
}

#[test]
fn test_malformed_env_value_is_a_config_error() {
    let err = parse_optional::<FailurePolicy>("GLEANER_FAILURE_POLICY", Some("sometimes".into()))
        .unwrap_err();
    assert!(matches!(err, ResearchError::Config(_)));
    assert!(err.to_string().contains("GLEANER_FAILURE_POLICY"));

    let err = parse_optional::<u64>("GLEANER_FETCH_TIMEOUT_SECS", Some("-3".into())).unwrap_err();
    assert!(matches!(err, ResearchError::Config(_)));
}

#[test]
fn test_optional_values() {
    assert_eq!(parse_optional::<f32>("GLEANER_TEMPERATURE", None).unwrap(), None);
    assert_eq!(parse_optional::<f32>("GLEANER_TEMPERATURE", Some("  ".into())).unwrap(), None);
    assert_eq!(
        parse_optional::<f32>("GLEANER_TEMPERATURE", Some("0.2".into())).unwrap(),
        Some(0.2)
    );
    assert!(matches!(
        parse_optional::<f32>("GLEANER_TEMPERATURE", Some("warm".into())),
        Err(ResearchError::Config(_))
    ));
}

#[test]
fn test_default_settings_match_pipeline_contract() {
    let settings = ResearchSettings::default();
    assert_eq!(settings.queries_per_question, 3);
    assert_eq!(settings.results_per_query, 3);
    assert_eq!(settings.max_page_chars, 10_000);
    assert_eq!(settings.min_report_words, 1_200);
    assert_eq!(settings.failure_policy, FailurePolicy::Isolate);
}
