use std::path::PathBuf;

use crate::api::{AnalyzeResponse, ApiError, ChatRequest, ChatResponse};
use crate::app::Model;
use crate::app::model::{CHAT_WELCOME, Phase, Request, ToastLevel};
use crate::session::{ChatEntry, PreviewImage, ResultTab};
use crate::upload::{ImageUpload, UploadError};

/// Alert raised when analyze is requested with nothing selected.
pub const NO_IMAGE_ALERT: &str = "Please select an image first";

/// Inline error appended when chatting without a session.
pub const NO_SESSION_ERROR: &str = "No active session. Analyze an image before chatting.";

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Image selection
    /// Open the path prompt
    OpenPathPrompt,
    /// Replace the path prompt text
    PathPromptInput(String),
    /// Load the path typed in the prompt
    SubmitPathPrompt,
    /// Close the path prompt
    CancelPathPrompt,
    /// Text pasted into the terminal, treated as a dropped file
    Dropped(String),
    /// Load an image from disk
    LoadImage(PathBuf),
    /// Result of reading and validating a file
    ImageLoaded(Result<ImageUpload, UploadError>),
    /// Drop the selected image and return to the upload area
    ChangeImage,

    // Analysis
    /// Send the selected image to `/analyze`
    Analyze,
    /// `/analyze` finished
    AnalyzeFinished {
        generation: u64,
        result: Result<AnalyzeResponse, ApiError>,
    },
    /// Start over from the upload area
    NewScan,

    // Tabs and scrolling
    /// Activate a result tab
    SelectTab(ResultTab),
    /// Activate the next tab
    NextTab,
    /// Activate the previous tab
    PrevTab,
    /// Scroll the active pane up by n lines
    ScrollUp(usize),
    /// Scroll the active pane down by n lines
    ScrollDown(usize),
    /// Scroll the active pane up one page
    PageUp,
    /// Scroll the active pane down one page
    PageDown,
    /// Go to the top of the active pane
    GoToTop,
    /// Go to the bottom of the active pane
    GoToBottom,

    // Chat
    /// Open the chat panel
    OpenChat,
    /// Close the chat panel
    CloseChat,
    /// Replace the chat input text
    ChatInput(String),
    /// Send the chat input to `/chat`
    SendChat,
    /// `/chat` finished
    ChatFinished {
        generation: u64,
        result: Result<ChatResponse, ApiError>,
    },
    /// Scroll the transcript up by n lines
    ChatScrollUp(usize),
    /// Scroll the transcript down by n lines
    ChatScrollDown(usize),

    // Export
    /// Copy the active pane's markdown to the clipboard
    CopyPane,
    /// Write an HTML report of the scan
    ExportReport,

    // Overlays
    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,
    /// Dismiss the alert
    DismissAlert,

    // Window
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here.
/// Network calls and file reads are queued on the model and performed by
/// the app afterwards.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        Message::OpenPathPrompt => {
            if model.phase.accepts_files() {
                model.path_prompt = Some(String::new());
            } else {
                model.show_toast(ToastLevel::Warning, "Start a new scan (n) to pick another image");
            }
        }
        Message::PathPromptInput(text) => {
            if model.path_prompt.is_some() {
                model.path_prompt = Some(text);
            }
        }
        Message::SubmitPathPrompt => {
            if let Some(text) = model.path_prompt.take() {
                model = match crate::upload::path_from_drop(&text) {
                    Some(path) => update(model, Message::LoadImage(path)),
                    None => model,
                };
            }
        }
        Message::CancelPathPrompt => model.path_prompt = None,
        Message::Dropped(text) => {
            if let Some(path) = crate::upload::path_from_drop(&text) {
                model = update(model, Message::LoadImage(path));
            }
        }
        Message::LoadImage(path) => {
            if model.phase.accepts_files() {
                model.set_pending_load(path);
            } else {
                model.show_toast(ToastLevel::Warning, "Start a new scan (n) to pick another image");
            }
        }
        Message::ImageLoaded(result) => match result {
            Ok(upload) if model.phase.accepts_files() => {
                model.session.preview = Some(PreviewImage::new(upload));
                model.phase = Phase::PreviewLoaded;
            }
            Ok(_) => {}
            Err(err) => model.alert = Some(err.to_string()),
        },
        Message::ChangeImage => {
            if model.phase == Phase::PreviewLoaded {
                model.reset_scan();
            }
        }

        Message::Analyze => start_analysis(&mut model),
        Message::AnalyzeFinished { generation, result } => {
            if generation == model.generation && model.phase == Phase::Analyzing {
                finish_analysis(&mut model, result);
            }
        }
        Message::NewScan => model.reset_scan(),

        Message::SelectTab(tab) => model.session.active_tab = tab,
        Message::NextTab => model.session.active_tab = model.session.active_tab.next(),
        Message::PrevTab => model.session.active_tab = model.session.active_tab.prev(),
        Message::ScrollUp(n) => model.active_viewport_mut().scroll_up(n),
        Message::ScrollDown(n) => model.active_viewport_mut().scroll_down(n),
        Message::PageUp => model.active_viewport_mut().page_up(),
        Message::PageDown => model.active_viewport_mut().page_down(),
        Message::GoToTop => model.active_viewport_mut().go_to_top(),
        Message::GoToBottom => model.active_viewport_mut().go_to_bottom(),

        Message::OpenChat => {
            model.chat_open = true;
            model.chat_unread = false;
            model.relayout();
            model.chat_viewport.go_to_bottom();
        }
        Message::CloseChat => {
            model.chat_open = false;
            model.relayout();
        }
        Message::ChatInput(text) => model.chat_input = text,
        Message::SendChat => send_chat(&mut model),
        Message::ChatFinished { generation, result } => {
            if generation == model.generation && model.chat_pending() {
                finish_chat(&mut model, result);
            }
        }
        Message::ChatScrollUp(n) => model.chat_viewport.scroll_up(n),
        Message::ChatScrollDown(n) => model.chat_viewport.scroll_down(n),

        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,
        Message::DismissAlert => model.alert = None,

        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            model.relayout();
        }
        Message::Quit => model.should_quit = true,
        Message::CopyPane | Message::ExportReport => {
            // Handled by the app
        }
    }

    model
}

fn start_analysis(model: &mut Model) {
    let Some(preview) = &model.session.preview else {
        model.alert = Some(NO_IMAGE_ALERT.to_string());
        return;
    };
    match model.phase {
        Phase::PreviewLoaded => {
            let upload = preview.upload().clone();
            model.generation += 1;
            model.phase = Phase::Analyzing;
            let generation = model.generation;
            model.enqueue(Request::Analyze { generation, upload });
        }
        Phase::Analyzing => {
            model.show_toast(ToastLevel::Warning, "Analysis already in progress");
        }
        Phase::Results => {
            model.show_toast(ToastLevel::Info, "Start a new scan (n) to analyze another image");
        }
        Phase::Idle => model.alert = Some(NO_IMAGE_ALERT.to_string()),
    }
}

fn finish_analysis(model: &mut Model, result: Result<AnalyzeResponse, ApiError>) {
    match result {
        Ok(response) if response.success => {
            model.set_results([
                response.gemini_analysis.as_deref(),
                response.llama_analysis.as_deref(),
                response.final_analysis.as_deref(),
            ]);
            model.phase = Phase::Results;
            model.session.session_id = response.session();
            if model.session.session_id.is_some() {
                model.chat_armed = true;
                model.chat_unread = !model.chat_open;
                model.push_chat(ChatEntry::assistant(CHAT_WELCOME));
            }
        }
        Ok(response) => {
            model.phase = Phase::PreviewLoaded;
            model.alert = Some(format!("Error: {}", response.error_message()));
        }
        Err(err) => {
            model.phase = Phase::PreviewLoaded;
            model.alert = Some(format!("Error: {err}"));
        }
    }
}

fn send_chat(model: &mut Model) {
    let text = model.chat_input.trim().to_string();
    if text.is_empty() {
        return;
    }
    if model.chat_pending() {
        model.show_toast(ToastLevel::Warning, "Waiting for the previous reply");
        return;
    }
    model.chat_input.clear();
    let Some(session_id) = model.session.session_id.clone() else {
        model.push_chat(ChatEntry::error(NO_SESSION_ERROR));
        return;
    };

    model.push_chat(ChatEntry::user(text.clone()));
    model.set_thinking(true);
    let generation = model.generation;
    model.enqueue(Request::Chat {
        generation,
        request: ChatRequest::new(text, &session_id),
    });
}

fn finish_chat(model: &mut Model, result: Result<ChatResponse, ApiError>) {
    model.transcript.set_thinking(false);
    let entry = match result {
        Ok(response) if response.success => match response.response {
            Some(reply) => ChatEntry::assistant(reply),
            None => ChatEntry::error(response.error_message()),
        },
        Ok(response) => ChatEntry::error(response.error_message()),
        Err(err) => ChatEntry::error(format!("Error: {err}")),
    };
    model.push_chat(entry);
    if !model.chat_open {
        model.chat_unread = true;
    }
}
