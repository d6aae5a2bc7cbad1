//! Analysis service client.
//!
//! Wire types for the two endpoints and the [`AnalysisApi`] trait the app
//! talks to. [`HttpApi`] is the real implementation; tests inject fakes.

mod http;

pub use http::HttpApi;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionId;
use crate::upload::ImageUpload;

/// Shown when the server reports failure without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Body of a `/analyze` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub gemini_analysis: Option<String>,
    #[serde(default)]
    pub llama_analysis: Option<String>,
    #[serde(default)]
    pub final_analysis: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Where the server stored the upload. Informational only.
    #[serde(default)]
    pub image_path: Option<String>,
}

impl AnalyzeResponse {
    /// Error text to show for a failed analysis.
    pub fn error_message(&self) -> &str {
        error_or_unknown(self.error.as_deref())
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(SessionId::new)
    }
}

/// Body of a `/chat` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: &SessionId) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.as_str().to_string(),
        }
    }
}

/// Body of a `/chat` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn error_message(&self) -> &str {
        error_or_unknown(self.error.as_deref())
    }
}

fn error_or_unknown(error: Option<&str>) -> &str {
    error.filter(|e| !e.trim().is_empty()).unwrap_or(UNKNOWN_ERROR)
}

/// Failures below the level of a parsed server response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

/// The two calls the app makes. Implementations block; the app runs them on
/// worker threads.
pub trait AnalysisApi: Send + Sync {
    /// POST the image to `/analyze`.
    fn analyze(&self, upload: &ImageUpload) -> Result<AnalyzeResponse, ApiError>;

    /// POST a follow-up question to `/chat`.
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_response_decodes_success() {
        let json = r##"{
            "success": true,
            "gemini_analysis": "# G",
            "llama_analysis": "# L",
            "final_analysis": "# F",
            "session_id": "s-1",
            "image_path": "static/uploads/x.png"
        }"##;
        let response: AnalyzeResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.session(), Some(SessionId::new("s-1")));
        assert_eq!(response.final_analysis.as_deref(), Some("# F"));
    }

    #[test]
    fn test_analyze_response_tolerates_missing_fields() {
        let response: AnalyzeResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.error_message(), UNKNOWN_ERROR);
        assert_eq!(response.session(), None);
    }

    #[test]
    fn test_empty_session_id_is_no_session() {
        let response: AnalyzeResponse =
            serde_json::from_str(r#"{"success": true, "session_id": ""}"#).unwrap();
        assert_eq!(response.session(), None);
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest::new("why?", &SessionId::new("abc"));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"message": "why?", "session_id": "abc"})
        );
    }

    #[test]
    fn test_chat_error_message() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"success": false, "error": "Session not found"}"#).unwrap();
        assert_eq!(response.error_message(), "Session not found");
    }
}
