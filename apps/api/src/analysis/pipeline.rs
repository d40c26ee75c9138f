//! Analysis pipeline: quota → extraction → length check → prompt → model → docx.
//!
//! The quota unit is consumed before extraction, so every later failure
//! (unreadable PDF, too little text, model error) still costs one credit.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::analysis::prompts::build_prompt;
use crate::errors::AppError;
use crate::extract::has_enough_text;
use crate::report::serialize;
use crate::session::{quota, SessionId};
use crate::state::AppState;

/// One uploaded PDF, held for the duration of a single request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    /// The model's answer, as written into the report.
    pub analysis: String,
    /// The generated .docx.
    pub report: Vec<u8>,
    /// Credits left in the session after this analysis.
    pub remaining: u32,
}

pub async fn run_analysis(
    state: &AppState,
    session_id: SessionId,
    upload: UploadedDocument,
) -> Result<AnalysisOutcome, AppError> {
    let max_quota = state.config.quota_max;

    let remaining = state.sessions.with_session(session_id, |session| {
        if !session.authenticated {
            return Err(AppError::Unauthorized);
        }
        if !quota::check_and_increment(session, max_quota) {
            return Err(AppError::QuotaExceeded { max: max_quota });
        }
        Ok(quota::remaining(session, max_quota))
    });
    let remaining = match remaining {
        Ok(remaining) => remaining,
        Err(e) => {
            warn!(session = %session_id.0, "analysis refused: {e}");
            return Err(e);
        }
    };

    info!(
        session = %session_id.0,
        file = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = upload.bytes.len(),
        remaining,
        "analysis started"
    );

    let extractor = Arc::clone(&state.extractor);
    let bytes = upload.bytes;
    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task failed: {e}")))?;

    let text = match extracted {
        Ok(text) => text,
        Err(e) => {
            warn!(session = %session_id.0, "PDF extraction failed: {e}");
            return Err(e.into());
        }
    };

    let min_chars = state.config.min_text_chars;
    if !has_enough_text(&text, min_chars) {
        let chars = text.chars().count();
        warn!(session = %session_id.0, chars, "extracted text too short, skipping model call");
        return Err(AppError::EmptyContent {
            chars,
            min: min_chars,
        });
    }

    let prompt = build_prompt(&state.prompt, &text);
    info!(
        session = %session_id.0,
        prompt_version = state.prompt.version,
        chars = prompt.len(),
        "calling model"
    );

    let analysis = state.analyzer.analyze(&prompt).await.map_err(|e| {
        warn!(session = %session_id.0, "model call failed: {e}");
        AppError::from(e)
    })?;

    let report = serialize(&state.report, &analysis)?;
    info!(
        session = %session_id.0,
        analysis_chars = analysis.len(),
        report_bytes = report.len(),
        "analysis finished"
    );

    Ok(AnalysisOutcome {
        analysis,
        report,
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{long_text, test_state, StubAnalyzer, StubExtractor};

    fn upload() -> UploadedDocument {
        UploadedDocument {
            file_name: Some("cctp.pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF-1.5 stub"),
        }
    }

    fn login(state: &AppState) -> SessionId {
        let (id, _) = state.sessions.resolve(None);
        state.sessions.with_session(id, |s| s.authenticated = true);
        id
    }

    #[tokio::test]
    async fn test_successful_analysis_returns_report_with_model_text() {
        let analyzer = StubAnalyzer::replying("ANALYSE DU CHANTIER LOT 02");
        let state = test_state(StubExtractor::text(long_text()), analyzer.clone());
        let id = login(&state);

        let outcome = run_analysis(&state, id, upload()).await.unwrap();

        assert_eq!(outcome.remaining, 4);
        assert_eq!(outcome.analysis, "ANALYSE DU CHANTIER LOT 02");
        assert_eq!(analyzer.calls(), 1);
        assert!(analyzer.last_prompt().unwrap().contains(&long_text()));
        let xml = crate::test_support::document_xml(&outcome.report);
        assert!(xml.contains("ANALYSE DU CHANTIER LOT 02"));
    }

    #[tokio::test]
    async fn test_sixth_request_is_denied_without_model_call() {
        let analyzer = StubAnalyzer::replying("ok");
        let state = test_state(StubExtractor::text(long_text()), analyzer.clone());
        let id = login(&state);

        for _ in 0..5 {
            run_analysis(&state, id, upload()).await.unwrap();
        }
        assert_eq!(state.sessions.snapshot(id).usage_count, 5);

        let err = run_analysis(&state, id, upload()).await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { max: 5 }));
        assert_eq!(state.sessions.snapshot(id).usage_count, 5);
        assert_eq!(analyzer.calls(), 5);
    }

    #[tokio::test]
    async fn test_malformed_pdf_consumes_quota_and_produces_nothing() {
        let analyzer = StubAnalyzer::replying("unused");
        let state = test_state(StubExtractor::failing(), analyzer.clone());
        let id = login(&state);

        let err = run_analysis(&state, id, upload()).await.unwrap_err();

        assert!(matches!(err, AppError::Extraction(_)));
        assert_eq!(state.sessions.snapshot(id).usage_count, 1);
        assert_eq!(analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_short_text_skips_model_and_warns() {
        let analyzer = StubAnalyzer::replying("unused");
        let state = test_state(StubExtractor::text("a".repeat(100)), analyzer.clone());
        let id = login(&state);

        let err = run_analysis(&state, id, upload()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::EmptyContent {
                chars: 100,
                min: 100
            }
        ));
        assert_eq!(analyzer.calls(), 0);
        assert_eq!(state.sessions.snapshot(id).usage_count, 1);
    }

    #[tokio::test]
    async fn test_model_failure_still_consumes_quota() {
        let analyzer = StubAnalyzer::failing();
        let state = test_state(StubExtractor::text(long_text()), analyzer.clone());
        let id = login(&state);

        let err = run_analysis(&state, id, upload()).await.unwrap_err();

        assert!(matches!(err, AppError::Ai(_)));
        assert_eq!(analyzer.calls(), 1);
        assert_eq!(state.sessions.snapshot(id).usage_count, 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let analyzer = StubAnalyzer::without_key();
        let state = test_state(StubExtractor::text(long_text()), analyzer);
        let id = login(&state);

        let err = run_analysis(&state, id, upload()).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unauthenticated_session_is_rejected_without_consuming() {
        let analyzer = StubAnalyzer::replying("unused");
        let state = test_state(StubExtractor::text(long_text()), analyzer.clone());
        let (id, _) = state.sessions.resolve(None);

        let err = run_analysis(&state, id, upload()).await.unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(state.sessions.snapshot(id).usage_count, 0);
        assert_eq!(analyzer.calls(), 0);
    }
}
