// CCTP analysis: prompt templates, the quota-gated pipeline and its HTTP handler.
// All model calls go through llm_client::Analyzer.

pub mod handlers;
pub mod pipeline;
pub mod prompts;
