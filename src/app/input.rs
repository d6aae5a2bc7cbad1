use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{App, Message, Model, Phase};
use crate::session::ResultTab;

const WHEEL_LINES: usize = 3;

impl App {
    pub(super) fn handle_event(event: &Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) => Self::handle_paste(text, model),
            Event::Resize(w, h) => Some(Message::Resize(*w, *h)),
            _ => None,
        }
    }

    /// Terminals deliver a dropped file as a bracketed paste of its path.
    fn handle_paste(text: &str, model: &Model) -> Option<Message> {
        if model.alert.is_some() || model.help_visible {
            return None;
        }
        if let Some(prompt) = &model.path_prompt {
            return Some(Message::PathPromptInput(format!("{prompt}{}", text.trim())));
        }
        if model.chat_open {
            return Some(Message::ChatInput(format!("{}{text}", model.chat_input)));
        }
        Some(Message::Dropped(text.to_string()))
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Message::Quit);
        }

        if model.alert.is_some() {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(Message::DismissAlert),
                _ => None,
            };
        }

        if model.help_visible {
            return match key.code {
                KeyCode::Char('?' | 'q') | KeyCode::F(1) | KeyCode::Esc | KeyCode::Enter => {
                    Some(Message::HideHelp)
                }
                _ => None,
            };
        }

        if let Some(prompt) = &model.path_prompt {
            return match key.code {
                KeyCode::Esc => Some(Message::CancelPathPrompt),
                KeyCode::Enter => Some(Message::SubmitPathPrompt),
                KeyCode::Backspace => {
                    let mut text = prompt.clone();
                    text.pop();
                    Some(Message::PathPromptInput(text))
                }
                KeyCode::Char(c) => Some(Message::PathPromptInput(format!("{prompt}{c}"))),
                _ => None,
            };
        }

        if model.chat_open {
            return Self::handle_chat_key(key, model);
        }

        match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') | KeyCode::F(1) => Some(Message::ToggleHelp),

            // Image selection and analysis
            KeyCode::Char('o') => Some(Message::OpenPathPrompt),
            KeyCode::Char('a') => Some(Message::Analyze),
            KeyCode::Enter if model.phase != Phase::Results => Some(Message::Analyze),
            KeyCode::Char('x') => Some(Message::ChangeImage),
            KeyCode::Char('n') => Some(Message::NewScan),

            // Tabs
            KeyCode::Char(c @ '1'..='3') => {
                let index = c.to_digit(10).map_or(0, |d| d as usize - 1);
                ResultTab::from_index(index).map(Message::SelectTab)
            }
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => Some(Message::NextTab),
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => Some(Message::PrevTab),

            // Scrolling
            KeyCode::Char('j') | KeyCode::Down => Some(Message::ScrollDown(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::ScrollUp(1)),
            KeyCode::Char(' ') | KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::GoToBottom),

            // Chat and export
            KeyCode::Char('c') => Some(Message::OpenChat),
            KeyCode::Char('y') => Some(Message::CopyPane),
            KeyCode::Char('s') => Some(Message::ExportReport),
            _ => None,
        }
    }

    /// While the chat panel is open, typing goes to the input line.
    fn handle_chat_key(key: KeyEvent, model: &Model) -> Option<Message> {
        match key.code {
            KeyCode::Esc => Some(Message::CloseChat),
            KeyCode::Enter => Some(Message::SendChat),
            KeyCode::Backspace => {
                let mut text = model.chat_input.clone();
                text.pop();
                Some(Message::ChatInput(text))
            }
            KeyCode::Up => Some(Message::ChatScrollUp(1)),
            KeyCode::Down => Some(Message::ChatScrollDown(1)),
            KeyCode::PageUp => Some(Message::ChatScrollUp(usize::from(
                model.chat_viewport.height().max(1),
            ))),
            KeyCode::PageDown => Some(Message::ChatScrollDown(usize::from(
                model.chat_viewport.height().max(1),
            ))),
            KeyCode::Tab => Some(Message::NextTab),
            KeyCode::BackTab => Some(Message::PrevTab),
            KeyCode::Char(c) => Some(Message::ChatInput(format!("{}{c}", model.chat_input))),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible || model.alert.is_some() {
            return None;
        }

        let (width, height) = model.terminal_size;
        let layout = crate::ui::screen_layout(Rect::new(0, 0, width, height), model);
        let in_chat = layout
            .chat
            .is_some_and(|chat| point_in_rect(mouse.column, mouse.row, chat));

        match mouse.kind {
            MouseEventKind::ScrollDown if in_chat => Some(Message::ChatScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp if in_chat => Some(Message::ChatScrollUp(WHEEL_LINES)),
            MouseEventKind::ScrollDown => Some(Message::ScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp => Some(Message::ScrollUp(WHEEL_LINES)),
            MouseEventKind::Down(MouseButton::Left) => {
                let tab_bar = layout.tab_bar?;
                if mouse.row != tab_bar.y {
                    return None;
                }
                crate::ui::tab_at_column(tab_bar, mouse.column).map(Message::SelectTab)
            }
            _ => None,
        }
    }
}

const fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}
