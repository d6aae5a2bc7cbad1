use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui_image::{Resize, StatefulImage};

use crate::app::{Model, Phase};
use crate::markdown::{LineType, RenderedLine};
use crate::session::Role;

use super::layout::{ScreenLayout, screen_layout, tab_labels};
use super::style::{
    dim_style, role_style, style_for_inline, style_for_line_type, tab_style, upload_border_style,
};
use super::{TEXT_PADDING, overlays, status};

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = screen_layout(area, model);

    frame.render_widget(Clear, layout.main);
    match model.phase {
        Phase::Idle => render_upload(model, frame, layout.main),
        Phase::PreviewLoaded => render_preview(model, frame, layout.main),
        Phase::Analyzing => render_loading(model, frame, layout.main),
        Phase::Results => render_results(model, frame, &layout),
    }

    if model.chat_open {
        render_chat(model, frame, &layout);
    }

    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, layout.status);
    } else {
        status::render_status_bar(model, frame, layout.status);
    }

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
    if let Some(message) = model.alert.as_deref() {
        overlays::render_alert(message, frame, area);
    }
}

fn render_upload(model: &Model, frame: &mut Frame, area: Rect) {
    let prompt_open = model.path_prompt.is_some();
    let mut lines = vec![
        Line::raw(""),
        Line::styled(
            "Drop an image file here",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::styled("(drag it onto the terminal window)", dim_style()),
        Line::raw(""),
    ];
    match model.path_prompt.as_deref() {
        Some(text) => {
            lines.push(Line::from(vec![
                Span::styled("Path: ", Style::default().fg(Color::Cyan)),
                Span::raw(text.to_string()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]));
            lines.push(Line::styled("Enter load · Esc cancel", dim_style()));
        }
        None => lines.push(Line::raw("or press o to type a path")),
    }

    let block = Block::default()
        .title(" Upload ")
        .borders(Borders::ALL)
        .border_style(upload_border_style(prompt_open))
        .padding(Padding::horizontal(TEXT_PADDING));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_preview(model: &mut Model, frame: &mut Frame, area: Rect) {
    let Some(preview) = model.session.preview.as_ref() else {
        return;
    };
    let upload = preview.upload();
    let title = format!(" {} ", upload.file_name());
    let placeholder = format!(
        "[image: {} · {} · {}]",
        upload.file_name(),
        upload.mime(),
        human_size(upload.bytes().len())
    );

    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let image_area = Rect {
        height: inner.height.saturating_sub(1),
        ..inner
    };
    let hint_area = Rect {
        y: inner.y + image_area.height,
        height: inner.height.min(1),
        ..inner
    };

    match model.preview_protocol.as_mut() {
        Some(protocol) if model.images_enabled => {
            let image = StatefulImage::default().resize(Resize::Fit(None));
            frame.render_stateful_widget(image, image_area, protocol);
        }
        _ => {
            let text = Paragraph::new(Line::styled(
                placeholder,
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center);
            let middle = Rect {
                y: image_area.y + image_area.height / 2,
                height: image_area.height.min(1),
                ..image_area
            };
            frame.render_widget(text, middle);
        }
    }

    let hint = Paragraph::new(Line::styled("a analyze · x change image", dim_style()))
        .alignment(Alignment::Center);
    frame.render_widget(hint, hint_area);
}

fn render_loading(model: &Model, frame: &mut Frame, area: Rect) {
    let file = model
        .session
        .preview
        .as_ref()
        .map_or("image", |preview| preview.upload().file_name());
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::styled(
            format!("{} Analyzing {file}...", spinner_frame(model.spinner_tick)),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Line::styled("This can take a minute.", dim_style()),
    ];
    let middle = Rect {
        y: inner.y + inner.height.saturating_sub(2) / 2,
        height: inner.height.min(2),
        ..inner
    };
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        middle,
    );
}

fn render_results(model: &Model, frame: &mut Frame, layout: &ScreenLayout) {
    if let Some(tab_bar) = layout.tab_bar {
        let active = model.active_tab();
        let mut spans = Vec::new();
        for (idx, (tab, label)) in tab_labels().into_iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(label, tab_style(tab == active)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), tab_bar);
    }

    let Some(pane_area) = layout.pane else {
        return;
    };
    let viewport = model.active_viewport();
    let lines = model
        .active_pane()
        .visible_lines(viewport.offset(), viewport.height() as usize);
    let content: Vec<Line> = lines.iter().map(styled_line).collect();

    let block = Block::default()
        .title(format!(" {} ", model.active_tab().title()))
        .borders(Borders::ALL)
        .padding(Padding::horizontal(TEXT_PADDING));
    frame.render_widget(Paragraph::new(content).block(block), pane_area);
}

fn render_chat(model: &Model, frame: &mut Frame, layout: &ScreenLayout) {
    let (Some(transcript_area), Some(input_area)) = (layout.transcript, layout.chat_input) else {
        return;
    };
    if let Some(column) = layout.chat {
        frame.render_widget(Clear, column);
    }

    let range = model.chat_viewport.visible_range();
    let content: Vec<Line> = model
        .chat_lines
        .get(range)
        .unwrap_or_default()
        .iter()
        .map(chat_line)
        .collect();
    let transcript = Paragraph::new(content).block(
        Block::default()
            .title(" Chat ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .padding(Padding::horizontal(TEXT_PADDING)),
    );
    frame.render_widget(transcript, transcript_area);

    let input_style = if model.chat_pending() {
        dim_style()
    } else {
        Style::default()
    };
    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::styled(model.chat_input.clone(), input_style),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .block(
        Block::default()
            .title(" Enter send · Esc close ")
            .borders(Borders::ALL),
    );
    frame.render_widget(input, input_area);
}

/// Transcript labels get their role's color; everything else styles like a pane.
fn chat_line(line: &RenderedLine) -> Line<'static> {
    if *line.line_type() == LineType::Heading(6)
        && let Some(role) = role_for_label(line.content())
    {
        return Line::styled(line.content().to_string(), role_style(role));
    }
    styled_line(line)
}

fn role_for_label(label: &str) -> Option<Role> {
    match label {
        "You" => Some(Role::User),
        "Assistant" => Some(Role::Assistant),
        "Error" => Some(Role::Error),
        _ => None,
    }
}

fn styled_line(line: &RenderedLine) -> Line<'static> {
    let line_style = style_for_line_type(line.line_type());
    match line.spans() {
        Some(spans) => Line::from(
            spans
                .iter()
                .map(|span| {
                    Span::styled(
                        span.text().to_string(),
                        style_for_inline(line_style, span.style()),
                    )
                })
                .collect::<Vec<_>>(),
        ),
        None => Line::styled(line.content().to_string(), line_style),
    }
}

// Display only; precision loss above 2^52 bytes is irrelevant
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} B")
    }
}
