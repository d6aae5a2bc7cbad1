use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, Phase, ToastLevel};

use super::render::{human_size, spinner_frame};

pub fn status_text(model: &Model) -> String {
    let phase_info = match model.phase {
        Phase::Idle => format!("Drop an image or press o  server: {}", model.server),
        Phase::PreviewLoaded => model.session.preview.as_ref().map_or_else(String::new, |p| {
            let upload = p.upload();
            format!(
                "{} ({})  a:analyze  x:change",
                upload.file_name(),
                human_size(upload.bytes().len())
            )
        }),
        Phase::Analyzing => format!("{} Analyzing...", spinner_frame(model.spinner_tick)),
        Phase::Results => {
            let viewport = model.active_viewport();
            format!(
                "{}  [{}%]  n:new scan",
                model.active_tab().title(),
                viewport.scroll_percent()
            )
        }
    };

    let chat_indicator = if model.chat_pending() {
        format!("  chat {}", spinner_frame(model.spinner_tick))
    } else if model.chat_unread {
        "  c:chat ●".to_string()
    } else if model.panels().chat_indicator && !model.chat_open {
        "  c:chat".to_string()
    } else {
        String::new()
    };

    format!(" {phase_info}{chat_indicator}  ?:help")
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let status_bar = Paragraph::new(status_text(model))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
