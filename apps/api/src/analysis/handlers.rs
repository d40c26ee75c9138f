//! Axum route handlers for the Analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::analysis::pipeline::{run_analysis, AnalysisOutcome, UploadedDocument};
use crate::errors::AppError;
use crate::report::{DOCX_MIME, REPORT_FILE_NAME};
use crate::session::SessionId;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";
const QUOTA_REMAINING_HEADER: HeaderName = HeaderName::from_static("x-quota-remaining");

/// JSON variant of the analysis result, for clients that show the answer
/// before offering the download.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
    pub remaining: u32,
    pub file_name: &'static str,
    /// The .docx, base64 encoded.
    pub report_base64: String,
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        Self {
            report_base64: STANDARD.encode(&outcome.report),
            analysis: outcome.analysis,
            remaining: outcome.remaining,
            file_name: REPORT_FILE_NAME,
        }
    }
}

/// POST /api/v1/analyze
///
/// Multipart upload of one CCTP PDF in the `file` field. Responds with the
/// generated .docx as an attachment, or with [`AnalyzeResponse`] when the
/// client accepts `application/json`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, AppError> {
    if !state.sessions.snapshot(session_id).authenticated {
        return Err(AppError::Unauthorized);
    }

    let upload = read_upload(multipart).await?;
    let outcome = run_analysis(&state, session_id, upload).await?;

    if wants_json(&headers) {
        return Ok(Json(AnalyzeResponse::from(outcome)).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
            ),
            (QUOTA_REMAINING_HEADER, outcome.remaining.to_string()),
        ],
        outcome.report,
    )
        .into_response())
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|media| {
            media
                .split(';')
                .next()
                .is_some_and(|m| m.trim().eq_ignore_ascii_case("application/json"))
        })
}

/// Reads exactly one PDF from the multipart body. Other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<UploadedDocument, AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if upload.is_some() {
            return Err(AppError::Validation(
                "only one file can be analysed at a time".to_string(),
            ));
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        if !is_pdf(file_name.as_deref(), content_type.as_deref()) {
            return Err(AppError::Validation("only PDF files are accepted".to_string()));
        }

        let bytes = field.bytes().await.map_err(upload_error)?;
        upload = Some(UploadedDocument { file_name, bytes });
    }

    upload.ok_or_else(|| {
        AppError::Validation(format!("a PDF file is required in the '{UPLOAD_FIELD}' field"))
    })
}

/// Body over the size limit → 413, anything else wrong with the body → 400.
fn upload_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("invalid upload: {}", e.body_text()))
    }
}

fn is_pdf(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    let by_type = content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("application/pdf"));
    let by_name = file_name.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"));
    by_type || by_name
}
