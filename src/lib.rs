// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. upload::UploadError)
    clippy::module_name_repetitions
)]

//! # Scanlens
//!
//! A terminal client for a medical image analysis service.
//!
//! Scanlens lets you:
//! - Pick an image by dropping it on the terminal or typing its path
//! - Preview it inline (Kitty, Sixel, half-block fallback)
//! - Send it to the server and read three analyses in tabs
//! - Ask follow-up questions in a chat tied to the analysis session
//! - Export the whole scan as a standalone HTML report
//!
//! ## Architecture
//!
//! Scanlens uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! Server calls run on worker threads and report back as messages.
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`api`]: `/analyze` and `/chat` client
//! - [`upload`]: Image file validation
//! - [`session`]: Session id, tabs and chat transcript
//! - [`markdown`]: Markdown to HTML and terminal lines
//! - [`highlight`]: Syntax highlighting
//! - [`preview`]: Terminal image preview
//! - [`report`]: HTML report export
//! - [`ui`]: Terminal UI components
//! - [`config`]: Layered flag files

pub mod api;
pub mod app;
pub mod config;
pub mod highlight;
pub mod markdown;
pub mod preview;
pub mod report;
pub mod session;
pub mod ui;
pub mod upload;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{AnalysisApi, HttpApi};
    pub use crate::app::{App, Message, Model, Phase};
    pub use crate::session::{ResultTab, SessionId};
    pub use crate::ui::viewport::Viewport;
    pub use crate::upload::ImageUpload;
}
