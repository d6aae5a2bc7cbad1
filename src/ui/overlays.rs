use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::Model;

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(2).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled("Scan", section_style));
    lines.push(Line::raw("  drop / paste path   Select an image"));
    lines.push(Line::raw("  o                   Type a path"));
    lines.push(Line::raw("  a / Enter           Analyze"));
    lines.push(Line::raw("  x / n               Change image / new scan"));
    lines.push(Line::raw("  ? / F1              Toggle help"));
    lines.push(Line::raw("  q / Ctrl-c          Quit"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Results", section_style));
    lines.push(Line::raw("  1 2 3, Tab, h/l     Switch tab"));
    lines.push(Line::raw("  j/k, Space/b, g/G   Scroll / page / ends"));
    lines.push(Line::raw("  y                   Copy pane markdown"));
    lines.push(Line::raw("  s                   Save HTML report"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Chat", section_style));
    lines.push(Line::raw("  c                   Open chat"));
    lines.push(Line::raw("  Enter / Esc         Send / close"));
    lines.push(Line::raw("  Up/Down, PgUp/PgDn  Scroll transcript"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Server: {}", model.server)));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::horizontal(2))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// Modal message drawn over everything until dismissed.
pub fn render_alert(message: &str, frame: &mut Frame, area: Rect) {
    let text_width = u16::try_from(message.width()).unwrap_or(u16::MAX);
    let popup_width = text_width
        .saturating_add(6)
        .clamp(30, area.width.saturating_sub(4).max(30));
    let inner_width = popup_width.saturating_sub(4).max(1);
    let rows = text_width.div_ceil(inner_width).max(1);
    // Borders, padding, message, blank, hint
    let popup_height = rows + 6;
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let lines = vec![
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::styled(
            "Enter to dismiss",
            Style::default().fg(Color::Indexed(245)),
        ),
    ];
    let block = Block::default()
        .title(" Alert ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
