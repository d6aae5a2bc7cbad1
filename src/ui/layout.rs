use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, Phase};
use crate::session::ResultTab;

use super::{CHAT_INPUT_ROWS, CHAT_WIDTH_PERCENT, MAIN_WIDTH_PERCENT, TEXT_PADDING};

/// Where each region of the screen is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Upload, preview, loading or results area
    pub main: Rect,
    /// Result tab row, present in the results phase
    pub tab_bar: Option<Rect>,
    /// Bordered analysis pane below the tabs
    pub pane: Option<Rect>,
    /// Whole chat column, present while chat is open
    pub chat: Option<Rect>,
    /// Transcript box inside the chat column
    pub transcript: Option<Rect>,
    /// Input box at the bottom of the chat column
    pub chat_input: Option<Rect>,
    /// Bottom row shared by the status bar and toasts
    pub status: Rect,
}

fn split_columns(body: Rect, chat_open: bool) -> (Rect, Option<Rect>) {
    if !chat_open {
        return (body, None);
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(MAIN_WIDTH_PERCENT),
            Constraint::Percentage(CHAT_WIDTH_PERCENT),
        ])
        .split(body);
    (chunks[0], Some(chunks[1]))
}

const fn body_height(total_height: u16) -> u16 {
    total_height.saturating_sub(1)
}

/// Compute every region for a frame of size `area`.
pub fn screen_layout(area: Rect, model: &Model) -> ScreenLayout {
    let body = Rect {
        height: body_height(area.height),
        ..area
    };
    let status = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    };
    let (main, chat) = split_columns(body, model.chat_open);

    let (tab_bar, pane) = if model.phase == Phase::Results {
        let tab_bar = Rect { height: main.height.min(1), ..main };
        let pane = Rect {
            y: main.y + tab_bar.height,
            height: main.height.saturating_sub(tab_bar.height),
            ..main
        };
        (Some(tab_bar), Some(pane))
    } else {
        (None, None)
    };

    let (transcript, chat_input) = chat.map_or((None, None), |column| {
        let input_rows = CHAT_INPUT_ROWS.min(column.height);
        let transcript = Rect {
            height: column.height - input_rows,
            ..column
        };
        let input = Rect {
            y: column.y + transcript.height,
            height: input_rows,
            ..column
        };
        (Some(transcript), Some(input))
    });

    ScreenLayout {
        main,
        tab_bar,
        pane,
        chat,
        transcript,
        chat_input,
        status,
    }
}

/// Columns of pane text for a terminal `total_width` wide.
pub fn pane_text_width(total_width: u16, chat_open: bool) -> u16 {
    let (main, _) = split_columns(Rect::new(0, 0, total_width, 1), chat_open);
    // Border and padding on both sides
    main.width.saturating_sub(2 + 2 * TEXT_PADDING).max(1)
}

/// Rows of pane text for a terminal `total_height` tall.
pub const fn pane_text_height(total_height: u16) -> u16 {
    let rows = body_height(total_height).saturating_sub(1 + 2);
    if rows == 0 { 1 } else { rows }
}

/// Columns of transcript text for a terminal `total_width` wide.
pub fn chat_text_width(total_width: u16) -> u16 {
    let (_, chat) = split_columns(Rect::new(0, 0, total_width, 1), true);
    chat.map_or(1, |column| {
        column.width.saturating_sub(2 + 2 * TEXT_PADDING).max(1)
    })
}

/// Rows of transcript text for a terminal `total_height` tall.
pub const fn chat_text_height(total_height: u16) -> u16 {
    let rows = body_height(total_height).saturating_sub(CHAT_INPUT_ROWS + 2);
    if rows == 0 { 1 } else { rows }
}

/// Tab labels in display order.
pub fn tab_labels() -> Vec<(ResultTab, String)> {
    ResultTab::ALL
        .iter()
        .map(|tab| (*tab, format!(" {} {} ", tab.index() + 1, tab.title())))
        .collect()
}

/// Which tab label covers `column`. Labels are separated by one blank cell.
pub fn tab_at_column(tab_bar: Rect, column: u16) -> Option<ResultTab> {
    let mut x = tab_bar.x;
    for (tab, label) in tab_labels() {
        let width = u16::try_from(label.width()).unwrap_or(u16::MAX);
        if column >= x && column < x.saturating_add(width) {
            return Some(tab);
        }
        x = x.saturating_add(width).saturating_add(1);
    }
    None
}
