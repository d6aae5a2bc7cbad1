//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Requests to the analysis server run on worker threads and come back to
//! the loop as [`Message`]s over a channel.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{CHAT_WELCOME, Model, Panels, Phase, Request, ToastLevel};
pub use update::{Message, NO_IMAGE_ALERT, NO_SESSION_ERROR, update};

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::api::AnalysisApi;
use crate::upload::MAX_UPLOAD_BYTES;

/// Main application struct that owns the server client and runs the event loop.
pub struct App {
    api: Arc<dyn AnalysisApi>,
    responses_tx: Sender<Message>,
    responses_rx: Receiver<Message>,
    initial_image: Option<PathBuf>,
    images_enabled: bool,
    force_half_cell: bool,
    max_upload_bytes: u64,
    server_label: String,
    report_dir: PathBuf,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application talking to `api`.
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        let (responses_tx, responses_rx) = mpsc::channel();
        Self {
            api,
            responses_tx,
            responses_rx,
            initial_image: None,
            images_enabled: true,
            force_half_cell: false,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            server_label: crate::config::DEFAULT_SERVER.to_string(),
            report_dir: PathBuf::from("."),
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Load this image on startup.
    pub fn with_initial_image(mut self, path: Option<PathBuf>) -> Self {
        self.initial_image = path;
        self
    }

    /// Enable or disable the terminal image preview.
    pub const fn with_images_enabled(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    /// Force half-block rendering instead of probing for a graphics protocol.
    pub const fn with_force_half_cell(mut self, force: bool) -> Self {
        self.force_half_cell = force;
        self
    }

    /// Refuse files larger than `limit` bytes.
    pub const fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Server address shown in the status bar.
    pub fn with_server_label(mut self, label: impl Into<String>) -> Self {
        self.server_label = label.into();
        self
    }

    /// Directory exported reports are written to.
    pub fn with_report_dir(mut self, dir: PathBuf) -> Self {
        self.report_dir = dir;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }

    /// Build the initial model for a terminal of the given size.
    pub fn init_model(&self, terminal_size: (u16, u16)) -> Model {
        let mut model = Model::new(terminal_size);
        model.images_enabled = self.images_enabled;
        model.server.clone_from(&self.server_label);
        model.report_dir.clone_from(&self.report_dir);
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        model
    }

    /// Apply a message: pure update, then its side effects.
    pub fn dispatch(&self, model: Model, msg: Message) -> Model {
        let side_msg = msg.clone();
        let mut model = update(model, msg);
        self.handle_message_side_effects(&mut model, &side_msg);
        model
    }
}
