//! Syntax highlighting for code blocks.
//!
//! Uses syntect for highlighting with Sublime Text syntax definitions, both for
//! terminal spans and for the HTML report.

use std::sync::{Mutex, OnceLock};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::markdown::{InlineColor, InlineSpan, InlineStyle};

/// Highlight `code` into one span list per line.
///
/// Unknown or missing languages produce plain code-styled spans.
pub fn highlight_code(language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>> {
    let code_style = InlineStyle {
        code: true,
        ..InlineStyle::default()
    };

    let Some(syntax) = language.and_then(find_syntax) else {
        return code
            .lines()
            .map(|line| vec![InlineSpan::new(line.to_string(), code_style)])
            .collect();
    };

    let mode = background_mode();
    let mut highlighter = HighlightLines::new(syntax, theme());
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter
            .highlight_line(line, syntax_set())
            .unwrap_or_default();
        let mut spans = Vec::with_capacity(ranges.len());
        for (style, text) in ranges {
            let text = text.trim_end_matches(['\n', '\r']);
            if text.is_empty() {
                continue;
            }
            let fg = InlineColor {
                r: style.foreground.r,
                g: style.foreground.g,
                b: style.foreground.b,
            };
            spans.push(InlineSpan::new(
                text.to_string(),
                InlineStyle {
                    fg: Some(adjust_fg_for_background(fg, mode)),
                    ..code_style
                },
            ));
        }
        lines.push(spans);
    }
    lines
}

/// Highlight `code` as an inline-styled HTML `<pre>` block.
///
/// Returns `None` when the language is not recognised, so callers can fall
/// back to a plain code block.
pub fn highlight_html(language: &str, code: &str) -> Option<String> {
    if language.is_empty() {
        return None;
    }
    let syntax = find_syntax(language)?;
    syntect::html::highlighted_html_for_string(code, syntax_set(), syntax, theme()).ok()
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let syntax_set = syntax_set();
    syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_name(language))
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let theme_set = ThemeSet::load_defaults();
        let preferred = match background_mode() {
            BackgroundMode::Dark => [
                "Monokai Extended",
                "base16-eighties.dark",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
            BackgroundMode::Light => {
                ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"].as_slice()
            }
        };

        for name in preferred {
            if let Some(theme) = theme_set.themes.get(*name) {
                return theme.clone();
            }
        }

        theme_set
            .themes
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

/// Terminal background brightness, as forced by config or detected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: OnceLock<Mutex<Option<HighlightBackground>>> = OnceLock::new();

/// Force the background mode. Must be called before the first highlight to
/// affect theme selection.
pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    let mut guard = lock.lock().expect("highlight background lock");
    *guard = mode;
}

/// Whether the terminal is believed to have a light background.
pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode() -> BackgroundMode {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(guard) = lock.lock()
        && let Some(mode) = *guard
    {
        return match mode {
            HighlightBackground::Light => BackgroundMode::Light,
            HighlightBackground::Dark => BackgroundMode::Dark,
        };
    }
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    match bg_str.parse::<u8>() {
        Ok(bg) if bg >= 7 => BackgroundMode::Light,
        _ => BackgroundMode::Dark,
    }
}

fn adjust_fg_for_background(color: InlineColor, mode: BackgroundMode) -> InlineColor {
    if mode == BackgroundMode::Dark {
        return color;
    }
    let luma =
        0.0722f32.mul_add(f32::from(color.b), 0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)));
    if luma < 155.0 {
        return color;
    }

    // Channels are scaled down from u8 so they stay in range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let darken = |c: u8| (f32::from(c) * 0.42).round() as u8;
    InlineColor {
        r: darken(color.r),
        g: darken(color.g),
        b: darken(color.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_produces_colored_spans() {
        let code = "fn main() {\n    let x = 1;\n}\n";
        let lines = highlight_code(Some("rust"), code);

        assert_eq!(lines.len(), 3);
        let has_color = lines.iter().flatten().any(|span| span.style().fg.is_some());
        assert!(has_color, "Expected at least one colored span for Rust");
    }

    #[test]
    fn test_highlighted_spans_drop_newlines() {
        let lines = highlight_code(Some("rust"), "let a = 1;\nlet b = 2;\n");
        assert!(
            lines
                .iter()
                .flatten()
                .all(|span| !span.text().contains('\n'))
        );
    }

    #[test]
    fn test_highlight_unknown_language_falls_back_to_plain() {
        let lines = highlight_code(Some("nope"), "just text");

        assert_eq!(lines.len(), 1);
        assert!(lines.iter().flatten().all(|span| span.style().fg.is_none()));
    }

    #[test]
    fn test_highlight_plain_code_sets_code_style() {
        let lines = highlight_code(None, "plain");
        assert!(lines[0].iter().all(|span| span.style().code));
    }

    #[test]
    fn test_highlight_html_known_language() {
        let html = highlight_html("python", "print('hi')\n").unwrap();
        assert!(html.starts_with("<pre"));
        assert!(html.contains("print"));
    }

    #[test]
    fn test_highlight_html_unknown_language() {
        assert!(highlight_html("", "x").is_none());
        assert!(highlight_html("definitely-not-a-language", "x").is_none());
    }

    #[test]
    fn test_colorfgbg_dark_background() {
        assert_eq!(background_mode_from_colorfgbg(Some("15;0")), BackgroundMode::Dark);
    }

    #[test]
    fn test_colorfgbg_light_background() {
        assert_eq!(background_mode_from_colorfgbg(Some("0;15")), BackgroundMode::Light);
    }

    #[test]
    fn test_light_mode_darkens_bright_fg() {
        let bright = InlineColor {
            r: 240,
            g: 230,
            b: 120,
        };
        let adjusted = adjust_fg_for_background(bright, BackgroundMode::Light);
        assert!(adjusted.r < bright.r);
        assert!(adjusted.g < bright.g);
        assert!(adjusted.b < bright.b);
    }

    #[test]
    fn test_dark_mode_keeps_color() {
        let color = InlineColor { r: 1, g: 2, b: 3 };
        assert_eq!(adjust_fg_for_background(color, BackgroundMode::Dark), color);
    }
}
