//! Blocking reqwest client for the analysis service.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use super::{AnalysisApi, AnalyzeResponse, ApiError, ChatRequest, ChatResponse};
use crate::upload::ImageUpload;

/// Longest response body quoted back in an [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Talks to a running analysis server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for `base_url`. `None` disables the request timeout.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

impl AnalysisApi for HttpApi {
    fn analyze(&self, upload: &ImageUpload) -> Result<AnalyzeResponse, ApiError> {
        let part = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.mime())
            .map_err(|err| ApiError::Transport(format!("Failed to build upload: {err}")))?;
        let form = Form::new().part("image", part);

        tracing::info!(
            file = upload.file_name(),
            bytes = upload.bytes().len(),
            "POST /analyze"
        );
        let response = self
            .client
            .post(self.url("analyze"))
            .multipart(form)
            .send()
            .map_err(transport)?;
        decode(response)
    }

    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        tracing::info!(session = %request.session_id, "POST /chat");
        let response = self
            .client
            .post(self.url("chat"))
            .json(request)
            .send()
            .map_err(transport)?;
        decode(response)
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    tracing::warn!("request failed: {err}");
    ApiError::Transport(err.to_string())
}

/// Parse the JSON body whatever the status. A body that does not parse is a
/// decode error on success and a status error otherwise.
fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().map_err(transport)?;
    tracing::debug!(status = status.as_u16(), len = body.len(), "response received");
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(err) if status.is_success() => Err(ApiError::Decode(err.to_string())),
        Err(_) => Err(ApiError::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        }),
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one canned response and hand back the raw request.
    fn serve_once(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(2)))
                .unwrap();
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(request).unwrap();
        });
        (format!("http://{addr}"), rx)
    }

    fn read_request(stream: &mut impl Read) -> String {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let Ok(n) = stream.read(&mut buf) else { break };
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    fn png_upload() -> ImageUpload {
        ImageUpload::from_bytes("chest.png".to_string(), b"\x89PNG fake".to_vec()).unwrap()
    }

    #[test]
    fn test_analyze_posts_multipart_image_field() {
        let (url, requests) = serve_once(
            "200 OK",
            r##"{"success":true,"gemini_analysis":"# G","session_id":"abc"}"##,
        );
        let api = HttpApi::new(&url, Some(Duration::from_secs(5))).unwrap();

        let response = api.analyze(&png_upload()).unwrap();
        assert!(response.success);
        assert_eq!(response.session(), Some(SessionId::new("abc")));

        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /analyze "));
        assert!(request.contains("multipart/form-data"));
        assert!(request.contains("name=\"image\"; filename=\"chest.png\""));
        assert!(request.contains("Content-Type: image/png"));
    }

    #[test]
    fn test_chat_posts_json_body() {
        let (url, requests) = serve_once("200 OK", r#"{"success":true,"response":"It is fine."}"#);
        let api = HttpApi::new(&format!("{url}/"), None).unwrap();

        let response = api
            .chat(&ChatRequest::new("Is it fine?", &SessionId::new("abc")))
            .unwrap();
        assert_eq!(response.response.as_deref(), Some("It is fine."));

        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /chat "));
        assert!(request.contains(r#""session_id":"abc""#));
        assert!(request.contains(r#""message":"Is it fine?""#));
    }

    #[test]
    fn test_error_status_with_json_body_is_a_response() {
        let (url, _requests) = serve_once(
            "500 Internal Server Error",
            r#"{"success":false,"error":"model offline"}"#,
        );
        let api = HttpApi::new(&url, None).unwrap();

        let response = api.analyze(&png_upload()).unwrap();
        assert!(!response.success);
        assert_eq!(response.error_message(), "model offline");
    }

    #[test]
    fn test_error_status_with_html_body_is_status_error() {
        let (url, _requests) = serve_once("413 Request Entity Too Large", "<h1>Too Large</h1>");
        let api = HttpApi::new(&url, None).unwrap();

        let err = api.analyze(&png_upload()).unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 413,
                body: "<h1>Too Large</h1>".to_string()
            }
        );
    }

    #[test]
    fn test_success_with_bad_json_is_decode_error() {
        let (url, _requests) = serve_once("200 OK", "not json");
        let api = HttpApi::new(&url, None).unwrap();

        let err = api.analyze(&png_upload()).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let api = HttpApi::new(&format!("http://{addr}"), Some(Duration::from_secs(2))).unwrap();

        let err = api.analyze(&png_upload()).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY + 10);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.len(), MAX_ERROR_BODY + 3);
    }
}
