//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`viewport`]: Scroll position of panes and the transcript
//! - [`style`]: Theming and colors
//!
//! Layout math lives in [`layout`](screen_layout) so the model can wrap
//! text at exactly the width the renderer will draw it.

pub mod style;
pub mod viewport;

mod layout;
mod overlays;
mod render;
mod status;

pub use layout::{
    ScreenLayout, chat_text_height, chat_text_width, pane_text_height, pane_text_width,
    screen_layout, tab_at_column, tab_labels,
};
pub use render::render;

/// Share of the width given to the results when the chat panel is open.
pub const MAIN_WIDTH_PERCENT: u16 = 60;
pub const CHAT_WIDTH_PERCENT: u16 = 40;
/// Blank columns on each side of pane and transcript text.
pub const TEXT_PADDING: u16 = 1;
/// Rows of the chat input box, borders included.
pub const CHAT_INPUT_ROWS: u16 = 3;
