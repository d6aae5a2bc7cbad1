//! Layout of markdown into styled terminal lines.

use comrak::nodes::{AstNode, ListDelimType, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::types::{InlineSpan, InlineStyle, LineType, RenderedLine};

const CODE_RIGHT_PADDING: usize = 2;

/// Lay out markdown source as terminal lines wrapped to `width` columns.
pub fn render_lines(source: &str, width: u16) -> Vec<RenderedLine> {
    let arena = Arena::new();
    let mut options = Options::default();
    super::configure_options(&mut options);
    let root = parse_document(&arena, source, &options);

    let mut builder = LineBuilder {
        lines: Vec::new(),
        wrap_width: usize::from(width.max(1)),
    };
    builder.block(root, 0, None);

    // Drop the trailing separator so panes don't end in blank rows.
    while builder
        .lines
        .last()
        .is_some_and(|line| matches!(line.line_type(), LineType::Empty))
    {
        builder.lines.pop();
    }
    builder.lines
}

/// Wrap plain text (no markdown interpretation) to `width` columns.
pub fn wrap_plain(text: &str, width: u16) -> Vec<RenderedLine> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    for source_line in text.lines() {
        if source_line.trim().is_empty() {
            lines.push(RenderedLine::new(String::new(), LineType::Empty));
            continue;
        }
        let span = InlineSpan::new(source_line.to_string(), InlineStyle::default());
        for line_spans in wrap_spans(&[span], width, "", "") {
            let content = spans_to_string(&line_spans);
            lines.push(RenderedLine::with_spans(content, LineType::Paragraph, line_spans));
        }
    }
    lines
}

struct LineBuilder {
    lines: Vec<RenderedLine>,
    wrap_width: usize,
}

impl LineBuilder {
    fn push_wrapped(&mut self, spans: &[InlineSpan], line_type: LineType, first: &str, next: &str) {
        for line_spans in wrap_spans(spans, self.wrap_width, first, next) {
            let content = spans_to_string(&line_spans);
            self.lines
                .push(RenderedLine::with_spans(content, line_type, line_spans));
        }
    }

    fn blank(&mut self) {
        self.lines
            .push(RenderedLine::new(String::new(), LineType::Empty));
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>, depth: usize, list_marker: Option<String>) {
        match &node.data.borrow().value {
            NodeValue::Heading(heading) => {
                if !self.lines.is_empty() {
                    ensure_trailing_empty_lines(&mut self.lines, 1);
                }
                let spans = collect_inline_spans(node);
                let prefix = format!("{} ", "#".repeat(usize::from(heading.level)));
                self.push_wrapped(&spans, LineType::Heading(heading.level), &prefix, "");
                self.blank();
            }

            NodeValue::Paragraph => {
                let spans = collect_inline_spans(node);
                self.push_wrapped(&spans, LineType::Paragraph, "", "");
                self.blank();
            }

            NodeValue::CodeBlock(code_block) => {
                let language = code_block
                    .info
                    .split_whitespace()
                    .next()
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string);
                let literal = code_block.literal.clone();
                self.code_block(language.as_deref(), &literal);
                self.blank();
            }

            NodeValue::HtmlBlock(html) => {
                let literal = html.literal.clone();
                for raw_line in literal.lines() {
                    let spans = vec![InlineSpan::new(raw_line.to_string(), InlineStyle::default())];
                    self.push_wrapped(&spans, LineType::Paragraph, "", "");
                }
                self.blank();
            }

            NodeValue::List(list) => {
                let list_depth = depth + 1;
                let start = list.start;
                let delimiter = match list.delimiter {
                    ListDelimType::Paren => ')',
                    ListDelimType::Period => '.',
                };
                let list_type = list.list_type;
                let list_len = node.children().count();
                let number_width = (start + list_len.saturating_sub(1)).to_string().len();

                for (index, child) in node.children().enumerate() {
                    let marker = match list_type {
                        ListType::Bullet => "• ".to_string(),
                        ListType::Ordered => format!(
                            "{:>width$}{} ",
                            start + index,
                            delimiter,
                            width = number_width
                        ),
                    };
                    self.block(child, list_depth, Some(marker));
                }
                if depth == 0 {
                    self.blank();
                }
            }

            NodeValue::Item(_) | NodeValue::TaskItem(_) => {
                let indent = "  ".repeat(depth.saturating_sub(1));
                let marker = match &node.data.borrow().value {
                    NodeValue::TaskItem(Some(_)) => "✓ ".to_string(),
                    NodeValue::TaskItem(None) => "□ ".to_string(),
                    _ => list_marker.unwrap_or_else(|| "- ".to_string()),
                };
                let prefix_first = format!("{indent}{marker}");
                let prefix_next = format!("{indent}{}", " ".repeat(marker.width()));
                let mut rendered_any = false;

                for child in node.children() {
                    let is_paragraph = matches!(child.data.borrow().value, NodeValue::Paragraph);
                    if is_paragraph {
                        let spans = collect_inline_spans(child);
                        let first = if rendered_any {
                            &prefix_next
                        } else {
                            &prefix_first
                        };
                        self.push_wrapped(&spans, LineType::ListItem(depth), first, &prefix_next);
                        rendered_any = true;
                    } else {
                        self.block(child, depth, None);
                    }
                }

                if !rendered_any {
                    let spans = collect_inline_spans(node);
                    self.push_wrapped(&spans, LineType::ListItem(depth), &prefix_first, &prefix_next);
                }
            }

            NodeValue::BlockQuote => {
                self.blockquote(node, 1);
                self.blank();
            }

            NodeValue::ThematicBreak => {
                self.lines.push(RenderedLine::new(
                    "─".repeat(self.wrap_width.min(40)),
                    LineType::HorizontalRule,
                ));
                self.blank();
            }

            NodeValue::Table(_) => {
                for line in render_table(node, self.wrap_width) {
                    self.lines.push(RenderedLine::new(line, LineType::Table));
                }
                self.blank();
            }

            _ => {
                for child in node.children() {
                    self.block(child, depth, list_marker.clone());
                }
            }
        }
    }

    fn code_block(&mut self, language: Option<&str>, literal: &str) {
        let content_width = literal
            .lines()
            .map(UnicodeWidthStr::width)
            .max()
            .unwrap_or(0)
            .min(self.wrap_width.saturating_sub(4 + CODE_RIGHT_PADDING).max(1));
        let label = format!(" {} ", language.unwrap_or("code"));
        let frame_inner_width = content_width + 2 + CODE_RIGHT_PADDING;
        let visible_label = truncate_text(&label, frame_inner_width);
        self.lines.push(RenderedLine::new(
            format!(
                "┌{}{}┐",
                visible_label,
                "─".repeat(frame_inner_width.saturating_sub(visible_label.width()))
            ),
            LineType::CodeBlock,
        ));

        for spans in crate::highlight::highlight_code(language, literal) {
            let trimmed = truncate_spans(&spans, content_width);
            let trimmed_width = spans_width(&trimmed);
            let padding = " ".repeat(content_width.saturating_sub(trimmed_width) + CODE_RIGHT_PADDING);

            let mut line_spans = Vec::with_capacity(trimmed.len() + 2);
            line_spans.push(InlineSpan::new("│ ".to_string(), InlineStyle::default()));
            line_spans.extend(trimmed);
            line_spans.push(InlineSpan::new(format!("{padding}│"), InlineStyle::default()));
            let content = spans_to_string(&line_spans);
            self.lines
                .push(RenderedLine::with_spans(content, LineType::CodeBlock, line_spans));
        }

        self.lines.push(RenderedLine::new(
            format!("└{}┘", "─".repeat(frame_inner_width)),
            LineType::CodeBlock,
        ));
    }

    fn blockquote<'a>(&mut self, node: &'a AstNode<'a>, quote_depth: usize) {
        let prefix = quote_prefix(quote_depth);
        for child in node.children() {
            let is_quote = matches!(child.data.borrow().value, NodeValue::BlockQuote);
            if is_quote {
                self.blockquote(child, quote_depth + 1);
            } else {
                let spans = collect_inline_spans(child);
                self.push_wrapped(&spans, LineType::BlockQuote, &prefix, &prefix);
            }
        }
    }
}

fn ensure_trailing_empty_lines(lines: &mut Vec<RenderedLine>, count: usize) {
    let existing = lines
        .iter()
        .rev()
        .take_while(|line| matches!(line.line_type(), LineType::Empty))
        .count();
    for _ in existing..count {
        lines.push(RenderedLine::new(String::new(), LineType::Empty));
    }
}

fn quote_prefix(depth: usize) -> String {
    let mut prefix = String::new();
    for _ in 0..depth {
        prefix.push_str("│ ");
    }
    prefix
}

fn render_table<'a>(table_node: &'a AstNode<'a>, wrap_width: usize) -> Vec<String> {
    let (alignments, mut rows, has_header) = collect_table_rows(table_node);
    let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return Vec::new();
    }
    for row in &mut rows {
        row.resize(num_cols, String::new());
    }

    let mut col_widths = vec![1_usize; num_cols];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            col_widths[idx] = col_widths[idx].max(cell.width());
        }
    }

    // Row width is 1 + sum(col_width + 3).
    let max_table_width = wrap_width.max(4);
    while 1 + col_widths.iter().sum::<usize>() + (3 * num_cols) > max_table_width {
        let Some((widest, _)) = col_widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
            break;
        };
        if col_widths[widest] <= 1 {
            break;
        }
        col_widths[widest] -= 1;
    }

    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.push(render_table_border(&col_widths, '┌', '┬', '┐'));
    for (idx, row) in rows.iter().enumerate() {
        lines.push(render_table_row(row, &col_widths, &alignments));
        if has_header && idx == 0 {
            lines.push(render_table_border(&col_widths, '├', '┼', '┤'));
        }
    }
    lines.push(render_table_border(&col_widths, '└', '┴', '┘'));
    lines
}

fn collect_table_rows<'a>(
    table_node: &'a AstNode<'a>,
) -> (Vec<TableAlignment>, Vec<Vec<String>>, bool) {
    let alignments = match &table_node.data.borrow().value {
        NodeValue::Table(table) => table.alignments.clone(),
        _ => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut has_header = false;
    for row_node in table_node.children() {
        match row_node.data.borrow().value {
            NodeValue::TableRow(true) => has_header = true,
            NodeValue::TableRow(false) => {}
            _ => continue,
        }
        let cells = row_node
            .children()
            .filter(|cell| matches!(cell.data.borrow().value, NodeValue::TableCell))
            .map(|cell| {
                extract_text(cell)
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        rows.push(cells);
    }

    (alignments, rows, has_header)
}

fn render_table_border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut out = String::new();
    out.push(left);
    for (idx, width) in widths.iter().enumerate() {
        out.push_str(&"─".repeat(width + 2));
        if idx + 1 < widths.len() {
            out.push(middle);
        }
    }
    out.push(right);
    out
}

fn render_table_row(cells: &[String], widths: &[usize], alignments: &[TableAlignment]) -> String {
    let mut out = String::from("│");
    for (idx, width) in widths.iter().enumerate() {
        let content = truncate_text(cells.get(idx).map_or("", String::as_str), *width);
        let padding = width.saturating_sub(content.width());

        out.push(' ');
        match alignments.get(idx).copied().unwrap_or(TableAlignment::None) {
            TableAlignment::Right => {
                out.push_str(&" ".repeat(padding));
                out.push_str(&content);
            }
            TableAlignment::Center => {
                let left = padding / 2;
                out.push_str(&" ".repeat(left));
                out.push_str(&content);
                out.push_str(&" ".repeat(padding - left));
            }
            TableAlignment::Left | TableAlignment::None => {
                out.push_str(&content);
                out.push_str(&" ".repeat(padding));
            }
        }
        out.push_str(" │");
    }
    out
}

fn truncate_text(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => text.push_str(t),
        NodeValue::Code(c) => {
            text.push('`');
            text.push_str(&c.literal);
            text.push('`');
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => text.push('\n'),
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

fn collect_inline_spans<'a>(node: &'a AstNode<'a>) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    collect_inline_spans_recursive(node, InlineStyle::default(), &mut spans);
    spans
}

fn collect_inline_spans_recursive<'a>(
    node: &'a AstNode<'a>,
    style: InlineStyle,
    spans: &mut Vec<InlineSpan>,
) {
    match &node.data.borrow().value {
        NodeValue::List(_) | NodeValue::Item(_) | NodeValue::TaskItem(_) => {}
        NodeValue::Text(t) => spans.push(InlineSpan::new(t.clone(), style)),
        NodeValue::HtmlInline(raw) => spans.push(InlineSpan::new(raw.clone(), style)),
        NodeValue::Code(code) => {
            let code_style = InlineStyle {
                code: true,
                emphasis: false,
                strong: false,
                strikethrough: false,
                ..style
            };
            spans.push(InlineSpan::new(code.literal.clone(), code_style));
        }
        NodeValue::Emph => {
            let next = InlineStyle {
                emphasis: true,
                ..style
            };
            for child in node.children() {
                collect_inline_spans_recursive(child, next, spans);
            }
        }
        NodeValue::Strong => {
            let next = InlineStyle {
                strong: true,
                ..style
            };
            for child in node.children() {
                collect_inline_spans_recursive(child, next, spans);
            }
        }
        NodeValue::Strikethrough => {
            let next = InlineStyle {
                strikethrough: true,
                ..style
            };
            for child in node.children() {
                collect_inline_spans_recursive(child, next, spans);
            }
        }
        NodeValue::Link(_) => {
            let next = InlineStyle { link: true, ..style };
            for child in node.children() {
                collect_inline_spans_recursive(child, next, spans);
            }
        }
        NodeValue::Image(image) => {
            let alt = extract_text(node);
            let label = if alt.is_empty() { image.url.clone() } else { alt };
            spans.push(InlineSpan::new(format!("[Image: {label}]"), style));
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            spans.push(InlineSpan::new(" ".to_string(), style));
        }
        _ => {
            for child in node.children() {
                collect_inline_spans_recursive(child, style, spans);
            }
        }
    }
}

fn wrap_spans(
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let max_token = width
        .saturating_sub(prefix_first.width().max(prefix_next.width()))
        .max(1);
    let tokens: Vec<InlineSpan> = spans
        .iter()
        .flat_map(split_inline_tokens)
        .flat_map(|token| split_wide_token(token, max_token))
        .collect();

    let mut lines: Vec<Vec<InlineSpan>> = Vec::new();
    let mut current: Vec<InlineSpan> = Vec::new();
    let mut current_width = 0usize;
    let mut has_word = false;

    let start_line = |prefix: &str, current: &mut Vec<InlineSpan>, current_width: &mut usize| {
        current.clear();
        if !prefix.is_empty() {
            current.push(InlineSpan::new(prefix.to_string(), InlineStyle::default()));
        }
        *current_width = prefix.width();
    };

    start_line(prefix_first, &mut current, &mut current_width);

    for token in tokens {
        let token_width = token.text().width();
        let token_is_ws = token.text().chars().all(char::is_whitespace);

        if current_width + token_width > width && has_word {
            lines.push(std::mem::take(&mut current));
            start_line(prefix_next, &mut current, &mut current_width);
            has_word = false;
        }

        // Drop leading whitespace at wrapped line starts.
        if token_is_ws && !has_word {
            continue;
        }

        current_width += token_width;
        current.push(token);
        has_word = true;
    }

    lines.push(current);
    lines
}

/// Hard-break a token wider than `max` columns (long URLs, hashes).
fn split_wide_token(token: InlineSpan, max: usize) -> Vec<InlineSpan> {
    if token.text().width() <= max {
        return vec![token];
    }
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut buf_width = 0usize;
    for ch in token.text().chars() {
        let ch_width = ch.width().unwrap_or(0);
        if buf_width + ch_width > max && !buf.is_empty() {
            out.push(InlineSpan::new(std::mem::take(&mut buf), token.style()));
            buf_width = 0;
        }
        buf.push(ch);
        buf_width += ch_width;
    }
    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, token.style()));
    }
    out
}

fn split_inline_tokens(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut ws_state: Option<bool> = None;

    for ch in span.text().chars() {
        let is_ws = ch.is_whitespace();
        if ws_state.is_some_and(|state| state != is_ws) {
            out.push(InlineSpan::new(std::mem::take(&mut buf), span.style()));
        }
        buf.push(ch);
        ws_state = Some(is_ws);
    }

    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, span.style()));
    }
    out
}

fn spans_to_string(spans: &[InlineSpan]) -> String {
    spans.iter().map(InlineSpan::text).collect()
}

fn spans_width(spans: &[InlineSpan]) -> usize {
    spans.iter().map(|span| span.text().width()).sum()
}

fn truncate_spans(spans: &[InlineSpan], max_width: usize) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut remaining = max_width;
    for span in spans {
        if remaining == 0 {
            break;
        }
        let taken = truncate_text(span.text(), remaining);
        let taken_width = taken.width();
        if !taken.is_empty() {
            out.push(InlineSpan::new(taken, span.style()));
            remaining = remaining.saturating_sub(taken_width);
        }
        if taken_width < span.text().width() {
            break;
        }
    }
    out
}
