//! Markdown rendering.
//!
//! Analysis text and chat replies arrive as markdown. This module turns them into:
//! - HTML via comrak (used for report export)
//! - Styled, wrapped lines for the terminal panes

mod html;
mod parser;
mod types;

pub use html::{escape_html, to_html};
pub use parser::{render_lines, wrap_plain};
pub use types::{InlineColor, InlineSpan, InlineStyle, LineType, RenderedLine, RenderedMarkdown};

use comrak::Options;

/// Text rendered in place of an analysis field the server left out.
pub const MISSING_ANALYSIS_FALLBACK: &str = "No analysis available.";

/// Render markdown for display at `width` columns.
///
/// # Example
///
/// ```
/// use scanlens::markdown;
///
/// let md = markdown::render("# Summary\n\nNo acute findings.", 80);
/// assert!(md.html().contains("<h1>"));
/// assert_eq!(md.lines()[0].content(), "# Summary");
/// ```
pub fn render(source: &str, width: u16) -> RenderedMarkdown {
    RenderedMarkdown::new(
        source.to_string(),
        to_html(source),
        render_lines(source, width),
        width,
    )
}

/// Render an optional field, substituting [`MISSING_ANALYSIS_FALLBACK`] when absent.
pub fn render_or_fallback(source: Option<&str>, width: u16) -> RenderedMarkdown {
    render(source.unwrap_or(MISSING_ANALYSIS_FALLBACK), width)
}

fn configure_options(options: &mut Options) {
    // GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.shortcodes = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_renders_fallback() {
        let md = render_or_fallback(None, 80);
        assert_eq!(md.source(), MISSING_ANALYSIS_FALLBACK);
        assert!(md.html().contains(MISSING_ANALYSIS_FALLBACK));
        assert_eq!(md.lines()[0].content(), MISSING_ANALYSIS_FALLBACK);
    }

    #[test]
    fn test_render_html_matches_to_html() {
        let source = "## Impression\n\n- small nodule\n- no effusion";
        let md = render(source, 60);
        assert_eq!(md.html(), to_html(source));
    }

    #[test]
    fn test_relayout_rewraps_lines_only() {
        let source = "word ".repeat(40);
        let mut md = render(&source, 100);
        let html = md.html().to_string();
        let wide = md.line_count();
        md.relayout(20);
        assert!(md.line_count() > wide);
        assert_eq!(md.width(), 20);
        assert_eq!(md.html(), html);
    }
}
