//! REST API types for the dashboard.
//!
//! Upload responses are the ingestion results themselves, with a job id
//! and the file name added alongside.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::preeti;
use crate::session::Theme;

/// Response to `POST /api/upload` and `POST /api/upload/sheets`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse<T> {
    /// Unique job identifier
    pub job_id: String,
    pub file_name: String,
    #[serde(flatten)]
    pub result: T,
}

impl<T> UploadResponse<T> {
    pub fn new(file_name: impl Into<String>, result: T) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            result,
        }
    }
}

/// Body of `POST /api/convert`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertRequest {
    pub text: String,
}

/// Response of `POST /api/convert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    /// Input as received
    pub text: String,
    pub converted: String,
    /// Whether the input looked like Preeti text
    pub legacy: bool,
}

impl ConvertResponse {
    pub fn for_text(text: String) -> Self {
        Self {
            converted: preeti::convert(&text),
            legacy: preeti::looks_like_legacy(&text),
            text,
        }
    }
}

/// Body of `PUT /api/session/theme`.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "success": false,
        "error": error,
    })
}
