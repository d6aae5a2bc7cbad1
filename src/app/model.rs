use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::api::ChatRequest;
use crate::markdown::{LineType, RenderedLine, RenderedMarkdown};
use crate::session::{ChatEntry, ResultTab, Role, SessionState, Transcript};
use crate::ui::viewport::Viewport;
use crate::upload::ImageUpload;

/// Where the scan is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Upload area shown, nothing selected
    #[default]
    Idle,
    /// Image selected, waiting for the user to analyze
    PreviewLoaded,
    /// `/analyze` in flight
    Analyzing,
    /// Analysis panes shown
    Results,
}

impl Phase {
    /// Whether a new file may be selected.
    pub const fn accepts_files(self) -> bool {
        matches!(self, Self::Idle | Self::PreviewLoaded)
    }
}

/// Which regions of the screen are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panels {
    pub upload: bool,
    pub preview: bool,
    pub loading: bool,
    pub results: bool,
    pub new_scan_control: bool,
    pub chat_indicator: bool,
    pub chat: bool,
}

/// Work queued by `update` for the app to send to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Analyze {
        generation: u64,
        upload: ImageUpload,
    },
    Chat {
        generation: u64,
        request: ChatRequest,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    pub phase: Phase,
    /// Preview image, session id and active tab
    pub session: SessionState,
    /// Rendered analysis, indexed by [`ResultTab::index`]
    pub panes: [RenderedMarkdown; 3],
    /// Scroll position of each pane
    pub pane_viewports: [Viewport; 3],
    pub transcript: Transcript,
    /// Transcript laid out for the chat panel
    pub chat_lines: Vec<RenderedLine>,
    pub chat_viewport: Viewport,
    /// Whether the chat panel is open
    pub chat_open: bool,
    /// Whether a session was established and the welcome entry seeded
    pub chat_armed: bool,
    /// A reply arrived while the panel was closed
    pub chat_unread: bool,
    pub chat_input: String,
    /// Path prompt text; `Some` while the prompt is open
    pub path_prompt: Option<String>,
    /// Modal message the user must dismiss
    pub alert: Option<String>,
    pub help_visible: bool,
    toast: Option<Toast>,
    /// Bumped on every reset and analyze; responses from older scans are dropped
    pub generation: u64,
    outbox: Vec<Request>,
    pending_load: Option<PathBuf>,
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    pub images_enabled: bool,
    /// Preview image protocol, absent when the image could not be decoded
    pub preview_protocol: Option<StatefulProtocol>,
    /// Terminal size in cells
    pub terminal_size: (u16, u16),
    /// Animation frame for the busy indicators
    pub spinner_tick: usize,
    /// Server base URL shown in the status bar
    pub server: String,
    /// Directory report exports are written to
    pub report_dir: PathBuf,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    pub should_quit: bool,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("phase", &self.phase)
            .field("session_id", &self.session.session_id)
            .field("active_tab", &self.session.active_tab)
            .field("generation", &self.generation)
            .field("chat_open", &self.chat_open)
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

/// Welcome entry seeded into the transcript when a session starts.
pub const CHAT_WELCOME: &str =
    "I've analyzed your image. Ask me anything about the findings.";

impl Model {
    /// Create a new model with default settings.
    pub fn new(terminal_size: (u16, u16)) -> Self {
        let mut model = Self {
            terminal_size,
            ..Self::default()
        };
        model.relayout();
        model
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    /// Which regions are visible in the current state.
    pub const fn panels(&self) -> Panels {
        Panels {
            upload: matches!(self.phase, Phase::Idle),
            preview: matches!(self.phase, Phase::PreviewLoaded),
            loading: matches!(self.phase, Phase::Analyzing),
            results: matches!(self.phase, Phase::Results),
            new_scan_control: matches!(self.phase, Phase::Results),
            chat_indicator: self.chat_armed,
            chat: self.chat_open,
        }
    }

    pub const fn active_tab(&self) -> ResultTab {
        self.session.active_tab
    }

    pub fn active_pane(&self) -> &RenderedMarkdown {
        &self.panes[self.session.active_tab.index()]
    }

    pub fn active_viewport(&self) -> &Viewport {
        &self.pane_viewports[self.session.active_tab.index()]
    }

    pub fn active_viewport_mut(&mut self) -> &mut Viewport {
        &mut self.pane_viewports[self.session.active_tab.index()]
    }

    /// Whether a request is in flight.
    pub const fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Analyzing) || self.transcript.is_thinking()
    }

    /// Whether a chat reply is pending.
    pub const fn chat_pending(&self) -> bool {
        self.transcript.is_thinking()
    }

    /// Requests queued since the last drain.
    pub fn outbox(&self) -> &[Request] {
        &self.outbox
    }

    pub(super) fn enqueue(&mut self, request: Request) {
        self.outbox.push(request);
    }

    pub(super) fn take_outbox(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Path waiting to be read and validated.
    pub fn pending_load(&self) -> Option<&PathBuf> {
        self.pending_load.as_ref()
    }

    pub(super) fn set_pending_load(&mut self, path: PathBuf) {
        self.pending_load = Some(path);
    }

    pub(super) const fn take_pending_load(&mut self) -> Option<PathBuf> {
        self.pending_load.take()
    }

    /// Render the three analysis fields into their panes.
    pub(super) fn set_results(&mut self, fields: [Option<&str>; 3]) {
        let width = self.pane_text_width();
        for (pane, field) in self.panes.iter_mut().zip(fields) {
            *pane = crate::markdown::render_or_fallback(field, width);
        }
        let height = self.pane_text_height();
        for (viewport, pane) in self.pane_viewports.iter_mut().zip(&self.panes) {
            *viewport = Viewport::new(width, height, pane.line_count());
        }
    }

    /// Append to the transcript and keep the newest entry in view.
    pub(super) fn push_chat(&mut self, entry: ChatEntry) {
        self.transcript.push(entry);
        self.rebuild_chat_lines();
        self.chat_viewport.go_to_bottom();
    }

    pub(super) fn set_thinking(&mut self, thinking: bool) {
        self.transcript.set_thinking(thinking);
        self.rebuild_chat_lines();
        self.chat_viewport.go_to_bottom();
    }

    /// Lay out the transcript at the current chat width.
    pub(super) fn rebuild_chat_lines(&mut self) {
        let width = self.chat_text_width();
        let mut lines = Vec::new();
        for entry in self.transcript.entries() {
            if !lines.is_empty() {
                lines.push(RenderedLine::new(String::new(), LineType::Empty));
            }
            let label = match entry.role {
                Role::User => "You",
                Role::Assistant => "Assistant",
                Role::Error => "Error",
            };
            lines.push(RenderedLine::new(label.to_string(), LineType::Heading(6)));
            match entry.role {
                Role::Assistant => {
                    lines.extend(crate::markdown::render_lines(&entry.text, width));
                }
                Role::User | Role::Error => {
                    lines.extend(crate::markdown::wrap_plain(&entry.text, width));
                }
            }
        }
        if self.transcript.is_thinking() {
            if !lines.is_empty() {
                lines.push(RenderedLine::new(String::new(), LineType::Empty));
            }
            lines.push(RenderedLine::new("Thinking...".to_string(), LineType::BlockQuote));
        }
        self.chat_lines = lines;
        let height = self.chat_text_height();
        self.chat_viewport.resize(width, height);
        self.chat_viewport.set_total_lines(self.chat_lines.len());
    }

    /// Re-wrap panes and chat after a resize or the chat panel toggling.
    pub(super) fn relayout(&mut self) {
        let width = self.pane_text_width();
        let height = self.pane_text_height();
        for (viewport, pane) in self.pane_viewports.iter_mut().zip(self.panes.iter_mut()) {
            pane.relayout(width);
            viewport.resize(width, height);
            viewport.set_total_lines(pane.line_count());
        }
        self.rebuild_chat_lines();
    }

    pub fn pane_text_width(&self) -> u16 {
        crate::ui::pane_text_width(self.terminal_size.0, self.chat_open)
    }

    pub fn pane_text_height(&self) -> u16 {
        crate::ui::pane_text_height(self.terminal_size.1)
    }

    pub fn chat_text_width(&self) -> u16 {
        crate::ui::chat_text_width(self.terminal_size.0)
    }

    pub fn chat_text_height(&self) -> u16 {
        crate::ui::chat_text_height(self.terminal_size.1)
    }

    /// Build the preview protocol for the selected image.
    pub fn load_preview_protocol(&mut self) {
        self.preview_protocol = None;
        if !self.images_enabled {
            return;
        }
        let (Some(picker), Some(preview)) = (&self.picker, &self.session.preview) else {
            return;
        };
        self.preview_protocol = crate::preview::build_protocol(picker, preview.upload().bytes());
    }

    /// Return every region to the initial state and invalidate in-flight work.
    pub(super) fn reset_scan(&mut self) {
        self.phase = Phase::Idle;
        self.session.reset();
        self.panes = Default::default();
        self.transcript.clear();
        self.chat_open = false;
        self.chat_armed = false;
        self.chat_unread = false;
        self.chat_input.clear();
        self.path_prompt = None;
        self.alert = None;
        self.preview_protocol = None;
        self.outbox.clear();
        self.pending_load = None;
        self.generation += 1;
        self.relayout();
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Report data borrowed from the current results.
    pub fn scan_report(&self) -> Option<crate::report::ScanReport<'_>> {
        if self.phase != Phase::Results {
            return None;
        }
        let preview = self.session.preview.as_ref()?;
        Some(crate::report::ScanReport {
            session_id: self.session.session_id.as_ref(),
            file_name: preview.upload().file_name(),
            data_url: preview.data_url(),
            panes: [
                self.panes[0].html(),
                self.panes[1].html(),
                self.panes[2].html(),
            ],
            transcript: self.transcript.entries(),
        })
    }
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            session: SessionState::default(),
            panes: Default::default(),
            pane_viewports: [
                Viewport::new(80, 20, 0),
                Viewport::new(80, 20, 0),
                Viewport::new(80, 20, 0),
            ],
            transcript: Transcript::default(),
            chat_lines: Vec::new(),
            chat_viewport: Viewport::new(40, 20, 0),
            chat_open: false,
            chat_armed: false,
            chat_unread: false,
            chat_input: String::new(),
            path_prompt: None,
            alert: None,
            help_visible: false,
            toast: None,
            generation: 0,
            outbox: Vec::new(),
            pending_load: None,
            picker: None,
            images_enabled: true,
            preview_protocol: None,
            terminal_size: (80, 24),
            spinner_tick: 0,
            server: crate::config::DEFAULT_SERVER.to_string(),
            report_dir: PathBuf::from("."),
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
        }
    }
}
