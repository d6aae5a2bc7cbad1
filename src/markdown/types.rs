//! Rendered markdown types.

/// Markdown rendered for both the terminal panes and HTML export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedMarkdown {
    /// Original markdown source
    source: String,
    /// HTML produced by comrak
    html: String,
    /// Styled lines laid out at `width`
    lines: Vec<RenderedLine>,
    /// Wrap width the lines were laid out for
    width: u16,
}

impl RenderedMarkdown {
    pub(crate) const fn new(
        source: String,
        html: String,
        lines: Vec<RenderedLine>,
        width: u16,
    ) -> Self {
        Self {
            source,
            html,
            lines,
            width,
        }
    }

    /// Get the markdown source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the HTML rendering of the source.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Get the terminal lines.
    pub fn lines(&self) -> &[RenderedLine] {
        &self.lines
    }

    /// Get the total number of rendered lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Width the terminal lines were wrapped to.
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Re-wrap the terminal lines for a new width. HTML is width independent.
    pub fn relayout(&mut self, width: u16) {
        if width == self.width {
            return;
        }
        self.lines = super::parser::render_lines(&self.source, width);
        self.width = width;
    }

    /// Get lines from `offset` to `offset + count`.
    pub fn visible_lines(&self, offset: usize, count: usize) -> &[RenderedLine] {
        let start = offset.min(self.lines.len());
        let end = (offset + count).min(self.lines.len());
        &self.lines[start..end]
    }
}

/// A single rendered line with styling information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// The text content of the line
    content: String,
    /// The type of line (for styling)
    line_type: LineType,
    /// Optional inline-styled spans for rendering
    spans: Vec<InlineSpan>,
}

impl RenderedLine {
    /// Create a new rendered line.
    pub const fn new(content: String, line_type: LineType) -> Self {
        Self {
            content,
            line_type,
            spans: Vec::new(),
        }
    }

    /// Create a new rendered line with inline spans.
    pub const fn with_spans(content: String, line_type: LineType, spans: Vec<InlineSpan>) -> Self {
        Self {
            content,
            line_type,
            spans,
        }
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the line type.
    pub const fn line_type(&self) -> &LineType {
        &self.line_type
    }

    /// Get inline spans, if present.
    pub fn spans(&self) -> Option<&[InlineSpan]> {
        if self.spans.is_empty() {
            None
        } else {
            Some(&self.spans)
        }
    }
}

/// Inline style flags for a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
    pub fg: Option<InlineColor>,
}

/// RGB color for inline styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A styled inline span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
}

impl InlineSpan {
    pub const fn new(text: String, style: InlineStyle) -> Self {
        Self { text, style }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }
}

/// Type of a rendered line, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Normal paragraph text
    Paragraph,
    /// Heading with level (1-6)
    Heading(u8),
    /// Code block line
    CodeBlock,
    /// Block quote line
    BlockQuote,
    /// List item with nesting level
    ListItem(usize),
    /// Table row
    Table,
    /// Horizontal rule
    HorizontalRule,
    /// Empty line
    Empty,
}
