pub mod aggregator;
pub mod config;
pub mod data_models;
pub mod error;
pub mod extractor;
pub mod fan_out;
pub mod fetcher;
pub mod llm;
pub mod pipeline;
pub mod query_expander;
pub mod search;
pub mod summarizer;
pub mod synthesizer;
