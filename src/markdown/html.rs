//! Markdown to HTML with highlighted code blocks.

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};

/// Convert markdown to an HTML fragment.
///
/// Fenced code with a known language is replaced by syntect's inline-styled
/// `<pre>`. Raw HTML coming from the source is escaped, never passed through.
pub fn to_html(source: &str) -> String {
    let arena = Arena::new();
    let mut options = Options::default();
    super::configure_options(&mut options);
    // Needed so the highlighted blocks we inject are emitted verbatim.
    options.render.unsafe_ = true;
    let root = parse_document(&arena, source, &options);

    for node in root.descendants() {
        rewrite_node(node);
    }

    let mut out = Vec::new();
    if let Err(err) = format_html(root, &options, &mut out) {
        tracing::warn!("html render failed: {err}");
        return escape_html(source);
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn rewrite_node<'a>(node: &'a AstNode<'a>) {
    let mut data = node.data.borrow_mut();
    let replacement = match &data.value {
        NodeValue::CodeBlock(code) => {
            let language = code.info.split_whitespace().next().unwrap_or_default();
            crate::highlight::highlight_html(language, &code.literal).map(|literal| {
                NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: 0,
                    literal,
                })
            })
        }
        NodeValue::HtmlBlock(html) => Some(NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: html.block_type,
            literal: format!("<p>{}</p>\n", escape_html(html.literal.trim_end())),
        })),
        NodeValue::HtmlInline(raw) => Some(NodeValue::Text(raw.clone())),
        _ => None,
    };
    if let Some(value) = replacement {
        data.value = value;
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
