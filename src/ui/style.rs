//! Colors for rendered analysis text and the scan chrome.
//!
//! Uses ANSI colors that adapt to the terminal's palette, with darker
//! variants when the background is light.

use ratatui::style::{Color, Modifier, Style};

use crate::markdown::{InlineColor, InlineStyle, LineType};
use crate::session::Role;

/// Base style for a rendered line.
pub fn style_for_line_type(line_type: &LineType) -> Style {
    let light_bg = crate::highlight::is_light_background();
    let pick = |light: u8, dark: Color| if light_bg { Color::Indexed(light) } else { dark };
    match line_type {
        LineType::Heading(1) => Style::default()
            .fg(pick(24, Color::Cyan))
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineType::Heading(2) => Style::default()
            .fg(pick(22, Color::Green))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(3) => Style::default()
            .fg(pick(58, Color::Yellow))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(4) => Style::default()
            .fg(pick(24, Color::Blue))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(5) => Style::default()
            .fg(pick(54, Color::Magenta))
            .add_modifier(Modifier::BOLD),
        LineType::Heading(_) => Style::default()
            .fg(pick(24, Color::Cyan))
            .add_modifier(Modifier::BOLD),

        LineType::CodeBlock => Style::default()
            .fg(pick(238, Color::Indexed(245)))
            .add_modifier(Modifier::DIM),

        LineType::BlockQuote => Style::default()
            .fg(pick(24, Color::Blue))
            .add_modifier(Modifier::ITALIC),

        LineType::HorizontalRule => Style::default()
            .fg(pick(241, Color::Indexed(240)))
            .add_modifier(Modifier::DIM),

        LineType::ListItem(_) | LineType::Table | LineType::Paragraph | LineType::Empty => {
            Style::default()
        }
    }
}

/// Style for an inline span, merged over its line's base style.
pub fn style_for_inline(base: Style, inline: InlineStyle) -> Style {
    let light_bg = crate::highlight::is_light_background();
    let mut style = base;

    if let Some(fg) = inline.fg {
        style = style
            .fg(fg_color_for_terminal(fg))
            .remove_modifier(Modifier::DIM);
    }
    if inline.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if inline.link {
        style = style.add_modifier(Modifier::UNDERLINED);
        if inline.fg.is_none() {
            style = style.fg(if light_bg {
                Color::Blue
            } else {
                Color::LightBlue
            });
        }
    }
    if inline.code && inline.fg.is_none() {
        style = style
            .fg(if light_bg {
                Color::Indexed(88)
            } else {
                Color::Red
            })
            .add_modifier(Modifier::BOLD);
    }

    style
}

/// Result tab label. The active tab is reversed so it reads as selected.
pub fn tab_style(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Indexed(245))
    }
}

/// Border of the upload area; highlighted while the path prompt is open.
pub fn upload_border_style(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Indexed(240))
    }
}

/// Label above each transcript entry.
pub fn role_style(role: Role) -> Style {
    let light_bg = crate::highlight::is_light_background();
    let color = match role {
        Role::User => {
            if light_bg {
                Color::Indexed(22)
            } else {
                Color::Green
            }
        }
        Role::Assistant => {
            if light_bg {
                Color::Indexed(24)
            } else {
                Color::Cyan
            }
        }
        Role::Error => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn dim_style() -> Style {
    Style::default().fg(Color::Indexed(245))
}

fn fg_color_for_terminal(fg: InlineColor) -> Color {
    if crate::preview::supports_truecolor_terminal() {
        Color::Rgb(fg.r, fg.g, fg.b)
    } else {
        Color::Indexed(crate::preview::rgb_to_cube(fg.r, fg.g, fg.b))
    }
}
