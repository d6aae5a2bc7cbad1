use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use scanlens::api::{AnalysisApi, AnalyzeResponse, ApiError, ChatRequest, ChatResponse, HttpApi};
use scanlens::app::{App, Message, Model, Phase};
use scanlens::session::{ResultTab, Role, SessionId};
use scanlens::upload::ImageUpload;

const WAIT: Duration = Duration::from_secs(5);

/// Answer one connection per canned body, in order, and report each raw request.
fn serve_sequence(bodies: Vec<&'static str>) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for body in bodies {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(2)))
                .unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(request).unwrap();
        }
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

fn write_png(dir: &Path) -> PathBuf {
    let path = dir.join("knee.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
    path
}

#[test]
fn test_full_scan_against_http_server() {
    let (url, requests) = serve_sequence(vec![
        r##"{"success":true,"gemini_analysis":"# Knee\n\nNo effusion.","llama_analysis":"Normal alignment.","final_analysis":"**Normal** study.","session_id":"knee-1","image_path":"static/uploads/knee.png"}"##,
        r#"{"success":true,"response":"Nothing needs follow-up."}"#,
    ]);
    let dir = tempfile::tempdir().unwrap();
    let api = HttpApi::new(&url, Some(WAIT)).unwrap();
    let app = App::new(Arc::new(api))
        .with_server_label(url.clone())
        .with_report_dir(dir.path().to_path_buf());

    let model = app.init_model((100, 30));
    assert_eq!(model.server, url);
    let model = app.dispatch(model, Message::LoadImage(write_png(dir.path())));
    assert_eq!(model.phase, Phase::PreviewLoaded);

    let mut model = app.dispatch(model, Message::Analyze);
    assert_eq!(model.phase, Phase::Analyzing);
    assert!(app.wait_for_response(&mut model, WAIT));

    let analyze = requests.recv_timeout(WAIT).unwrap();
    assert!(analyze.starts_with("POST /analyze "));
    assert!(analyze.contains("name=\"image\"; filename=\"knee.png\""));
    assert!(analyze.contains("Content-Type: image/png"));

    assert_eq!(model.phase, Phase::Results);
    assert_eq!(model.session.session_id, Some(SessionId::new("knee-1")));
    assert_eq!(
        model.panes[ResultTab::Final.index()].html(),
        "<p><strong>Normal</strong> study.</p>\n"
    );

    let model = app.dispatch(model, Message::OpenChat);
    let model = app.dispatch(model, Message::ChatInput("Any follow-up?".to_string()));
    let mut model = app.dispatch(model, Message::SendChat);
    assert!(app.wait_for_response(&mut model, WAIT));

    let chat = requests.recv_timeout(WAIT).unwrap();
    assert!(chat.starts_with("POST /chat "));
    let body = chat.split("\r\n\r\n").nth(1).unwrap();
    let sent: ChatRequest = serde_json::from_str(body).unwrap();
    assert_eq!(
        sent,
        ChatRequest {
            message: "Any follow-up?".to_string(),
            session_id: "knee-1".to_string(),
        }
    );

    let last = model.transcript.entries().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.text, "Nothing needs follow-up.");

    let model = app.dispatch(model, Message::ExportReport);
    assert!(dir.path().join("scanlens-knee-1.html").exists());
    assert!(model.active_toast().is_some());
}

#[test]
fn test_server_failure_reported_as_alert() {
    let (url, _requests) = serve_sequence(vec![r#"{"success":false,"error":"GPU offline"}"#]);
    let dir = tempfile::tempdir().unwrap();
    let app = App::new(Arc::new(HttpApi::new(&url, Some(WAIT)).unwrap()));

    let model = app.dispatch(app.init_model((80, 24)), Message::LoadImage(write_png(dir.path())));
    let mut model = app.dispatch(model, Message::Analyze);
    assert!(app.wait_for_response(&mut model, WAIT));

    assert_eq!(model.phase, Phase::PreviewLoaded);
    assert_eq!(model.alert.as_deref(), Some("Error: GPU offline"));
}

/// Holds every analyze call until released, so a reset can happen first.
struct GatedApi {
    gate: Mutex<Receiver<()>>,
}

impl AnalysisApi for GatedApi {
    fn analyze(&self, _upload: &ImageUpload) -> Result<AnalyzeResponse, ApiError> {
        let _ = self.gate.lock().unwrap().recv_timeout(WAIT);
        Ok(AnalyzeResponse {
            success: true,
            gemini_analysis: Some("late".to_string()),
            session_id: Some("stale".to_string()),
            ..AnalyzeResponse::default()
        })
    }

    fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        Err(ApiError::Transport("unused".to_string()))
    }
}

#[test]
fn test_response_after_new_scan_is_discarded() {
    let (release, gate) = mpsc::channel();
    let app = App::new(Arc::new(GatedApi {
        gate: Mutex::new(gate),
    }));
    let dir = tempfile::tempdir().unwrap();

    let model = app.dispatch(app.init_model((80, 24)), Message::LoadImage(write_png(dir.path())));
    let model = app.dispatch(model, Message::Analyze);
    let mut model: Model = app.dispatch(model, Message::NewScan);
    assert_eq!(model.phase, Phase::Idle);

    release.send(()).unwrap();
    assert!(app.wait_for_response(&mut model, WAIT));

    assert_eq!(model.phase, Phase::Idle);
    assert!(model.session.session_id.is_none());
    assert!(model.panes[0].source().is_empty());
    assert!(!model.chat_armed);
}
