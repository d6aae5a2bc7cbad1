use std::io::{Write, stdout};
use std::sync::Arc;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::Duration;

use base64::Engine;

use crate::api::ApiError;
use crate::app::{App, Message, Model, Request, ToastLevel, update};
use crate::upload::ImageUpload;

impl App {
    pub(super) fn handle_message_side_effects(&self, model: &mut Model, msg: &Message) {
        match msg {
            Message::CopyPane => Self::copy_active_pane(model),
            Message::ExportReport => Self::export_report(model),
            _ => {}
        }
        self.load_pending_image(model);
        self.send_requests(model);
    }

    /// Read and validate a file queued by `update`, then feed the result back.
    fn load_pending_image(&self, model: &mut Model) {
        let Some(path) = model.take_pending_load() else {
            return;
        };
        let result = ImageUpload::from_path_with_limit(&path, self.max_upload_bytes);
        match &result {
            Ok(upload) => tracing::info!(
                path = %path.display(),
                mime = upload.mime(),
                bytes = upload.bytes().len(),
                "image accepted"
            ),
            Err(err) => tracing::info!(path = %path.display(), "image rejected: {err}"),
        }
        let accepted = result.is_ok();
        *model = update(std::mem::take(model), Message::ImageLoaded(result));
        if accepted {
            model.load_preview_protocol();
        }
    }

    /// Start a worker thread for each queued request.
    fn send_requests(&self, model: &mut Model) {
        for request in model.take_outbox() {
            let (name, generation, is_chat) = match &request {
                Request::Analyze { generation, .. } => ("scanlens-analyze", *generation, false),
                Request::Chat { generation, .. } => ("scanlens-chat", *generation, true),
            };
            let api = Arc::clone(&self.api);
            let tx = self.responses_tx.clone();
            let spawned = thread::Builder::new()
                .name(name.to_string())
                .spawn(move || {
                    let reply = match request {
                        Request::Analyze { generation, upload } => Message::AnalyzeFinished {
                            generation,
                            result: api.analyze(&upload),
                        },
                        Request::Chat {
                            generation,
                            request,
                        } => Message::ChatFinished {
                            generation,
                            result: api.chat(&request),
                        },
                    };
                    // The receiver is gone only when the app is shutting down.
                    let _ = tx.send(reply);
                });
            if let Err(err) = spawned {
                tracing::warn!("failed to start {name} worker: {err}");
                let error = ApiError::Transport(err.to_string());
                let reply = if is_chat {
                    Message::ChatFinished {
                        generation,
                        result: Err(error),
                    }
                } else {
                    Message::AnalyzeFinished {
                        generation,
                        result: Err(error),
                    }
                };
                let _ = self.responses_tx.send(reply);
            }
        }
    }

    /// Apply every response that has arrived. Returns whether any did.
    pub fn drain_responses(&self, model: &mut Model) -> bool {
        let mut received = false;
        while let Ok(msg) = self.responses_rx.try_recv() {
            received = true;
            self.apply_response(model, msg);
        }
        received
    }

    /// Block until one response arrives or `timeout` passes.
    pub fn wait_for_response(&self, model: &mut Model, timeout: Duration) -> bool {
        match self.responses_rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.apply_response(model, msg);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    fn apply_response(&self, model: &mut Model, msg: Message) {
        if let Message::AnalyzeFinished { generation, .. } | Message::ChatFinished { generation, .. } =
            &msg
            && *generation != model.generation
        {
            tracing::debug!(
                generation,
                current = model.generation,
                "dropping response from an earlier scan"
            );
        }
        *model = self.dispatch(std::mem::take(model), msg);
    }

    fn copy_active_pane(model: &mut Model) {
        let text = model.active_pane().source().to_string();
        if text.is_empty() {
            model.show_toast(ToastLevel::Info, "Nothing to copy");
            return;
        }
        let title = model.active_tab().title();
        match copy_to_clipboard(&text) {
            Ok(()) => model.show_toast(ToastLevel::Info, format!("Copied {title}")),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
        }
    }

    fn export_report(model: &mut Model) {
        let Some(report) = model.scan_report() else {
            model.show_toast(ToastLevel::Info, "Nothing to export yet");
            return;
        };
        let dir = model.report_dir.clone();
        match crate::report::write_report(&dir, &report) {
            Ok(path) => {
                model.show_toast(ToastLevel::Info, format!("Saved {}", path.display()));
            }
            Err(err) => {
                tracing::warn!("report export failed: {err:#}");
                model.show_toast(ToastLevel::Error, format!("Export failed: {err:#}"));
            }
        }
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
