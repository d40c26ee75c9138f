//! Stubs and fixtures shared by unit tests.

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::analysis::prompts::CCTP_ANALYSIS;
use crate::config::Config;
use crate::extract::{ExtractionError, TextExtractor};
use crate::llm_client::{Analyzer, LlmError};
use crate::report::ReportTemplate;
use crate::session::SessionStore;
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "btp-2025";

/// Well over the 100 character threshold.
pub fn long_text() -> String {
    "CCTP Lot 02 Gros oeuvre. Echafaudage de classe 4 obligatoire, grue a tour, \
     chantier en site occupe, tri des dechets sur site, horaires 8h-17h. "
        .repeat(3)
}

pub struct StubExtractor {
    result: Result<String, String>,
}

impl StubExtractor {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err("invalid file header".to_string()),
        }
    }
}

impl TextExtractor for StubExtractor {
    fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractionError> {
        self.result.clone().map_err(ExtractionError::Parse)
    }
}

#[derive(Clone)]
enum Reply {
    Text(String),
    Fail,
    NoKey,
}

/// Records every prompt it receives.
#[derive(Clone)]
pub struct StubAnalyzer {
    reply: Reply,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl StubAnalyzer {
    fn with(reply: Reply) -> Self {
        Self {
            reply,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with(Reply::Text(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::with(Reply::Fail)
    }

    pub fn without_key() -> Self {
        Self::with(Reply::NoKey)
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(&self, prompt: &str) -> Result<String, LlmError> {
        if let Reply::NoKey = self.reply {
            return Err(LlmError::MissingApiKey);
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            _ => Err(LlmError::Api {
                status: 429,
                message: "Resource has been exhausted".to_string(),
            }),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        access_password: Some(TEST_PASSWORD.to_string()),
        google_api_key: Some("test-key".to_string()),
        gemini_model: "gemini-1.5-flash".to_string(),
        gemini_api_base: "http://127.0.0.1:9".to_string(),
        quota_max: 5,
        min_text_chars: 100,
        max_upload_bytes: 1024 * 1024,
        session_ttl_secs: 3600,
        max_sessions: 1000,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

pub fn test_state(extractor: StubExtractor, analyzer: StubAnalyzer) -> AppState {
    let config = test_config();
    AppState {
        sessions: SessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
            config.max_sessions,
        ),
        config,
        extractor: Arc::new(extractor),
        analyzer: Arc::new(analyzer),
        prompt: CCTP_ANALYSIS,
        report: ReportTemplate::default(),
    }
}

/// Returns `word/document.xml` from a generated .docx.
pub fn document_xml(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}
