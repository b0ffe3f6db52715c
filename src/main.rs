use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use gleaner::config::{Config, FailurePolicy};
use gleaner::fetcher::HttpFetcher;
use gleaner::llm::OpenAiChat;
use gleaner::pipeline::Researcher;
use gleaner::search::DuckDuckGoSearch;

#[derive(Parser, Debug)]
#[command(author, version, about = "Research a question on the web and write a report", long_about = None)]
struct Args {
    /// The question to research
    #[arg(default_value = "What is the difference between Langsmith and Langchain?")]
    question: String,

    /// Model name sent to the completion endpoint
    #[arg(short, long)]
    model: Option<String>,

    /// Search results to summarize per generated query
    #[arg(short, long)]
    results_per_query: Option<usize>,

    /// Sampling temperature for every completion
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Minimum report length requested from the model
    #[arg(long)]
    min_words: Option<usize>,

    /// Abort on the first search, model or parse failure
    #[arg(long)]
    strict: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber (also picks up `log` records)
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(n) = args.results_per_query {
        config.research.results_per_query = n;
        config.research.page_concurrency = n.max(1);
    }
    if args.temperature.is_some() {
        config.temperature = args.temperature;
    }
    if let Some(n) = args.min_words {
        config.research.min_report_words = n;
    }
    if args.strict {
        config.research.failure_policy = FailurePolicy::Abort;
    }

    let mut model = OpenAiChat::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.model_timeout,
    )?;
    if let Some(temperature) = config.temperature {
        model = model.with_temperature(temperature);
    }
    let search = DuckDuckGoSearch::new(config.fetch_timeout)?;
    let fetcher = HttpFetcher::new(config.fetch_timeout)?;

    let researcher = Researcher::new(model, search, fetcher, config.research_settings());
    let report = researcher
        .run(&args.question)
        .await
        .context("research run failed")?;

    tracing::info!(
        sources = report.sources.len(),
        generated_at = %report.generated_at,
        "research complete"
    );

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &report.markdown)
                .await
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!("report written to {}", path.display());
        }
        None => println!("{}", report.markdown),
    }
    Ok(())
}
