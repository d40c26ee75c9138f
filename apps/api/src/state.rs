use std::sync::Arc;

use crate::analysis::prompts::PromptTemplate;
use crate::config::Config;
use crate::extract::TextExtractor;
use crate::llm_client::Analyzer;
use crate::report::ReportTemplate;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    /// PDF-to-text backend. Default: `PdfTextExtractor`.
    pub extractor: Arc<dyn TextExtractor>,
    /// Model backend. Default: `GeminiClient`.
    pub analyzer: Arc<dyn Analyzer>,
    pub prompt: PromptTemplate,
    pub report: ReportTemplate,
}
