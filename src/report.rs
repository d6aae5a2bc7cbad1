//! Standalone HTML export of a finished scan.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::markdown::{escape_html, to_html};
use crate::session::{ChatEntry, ResultTab, Role, SessionId};

/// Everything that goes into a report, borrowed from the app model.
#[derive(Debug, Clone, Copy)]
pub struct ScanReport<'a> {
    pub session_id: Option<&'a SessionId>,
    pub file_name: &'a str,
    pub data_url: &'a str,
    /// HTML for each pane, in [`ResultTab::ALL`] order.
    pub panes: [&'a str; 3],
    pub transcript: &'a [ChatEntry],
}

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:2rem auto;padding:0 1rem}\
img.preview{max-width:100%;max-height:24rem;display:block;margin:1rem 0}\
section{border-top:1px solid #ccc;margin-top:1.5rem}\
pre{padding:.75rem;overflow-x:auto}\
.chat .user{font-weight:bold}.chat .error{color:#b00020}";

/// Render the report as a complete HTML document.
pub fn render_report(report: &ScanReport<'_>) -> String {
    let title = report.session_id.map_or_else(
        || "Scan report".to_string(),
        |id| format!("Scan report {}", escape_html(id.as_str())),
    );
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{title}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>\n</head>\n<body>");
    let _ = writeln!(html, "<h1>{title}</h1>");
    let _ = writeln!(
        html,
        "<img class=\"preview\" alt=\"{name}\" src=\"{src}\">\n<p>{name}</p>",
        name = escape_html(report.file_name),
        src = escape_html(report.data_url),
    );

    for (tab, pane) in ResultTab::ALL.iter().zip(report.panes) {
        let _ = writeln!(
            html,
            "<section class=\"pane\">\n<h2>{}</h2>\n{pane}</section>",
            tab.title()
        );
    }

    if !report.transcript.is_empty() {
        html.push_str("<section class=\"chat\">\n<h2>Chat</h2>\n");
        for entry in report.transcript {
            let (class, label, body) = match entry.role {
                Role::User => ("user", "You", format!("<p>{}</p>", escape_html(&entry.text))),
                Role::Assistant => ("assistant", "Assistant", to_html(&entry.text)),
                Role::Error => ("error", "Error", format!("<p>{}</p>", escape_html(&entry.text))),
            };
            let _ = writeln!(
                html,
                "<div class=\"{class}\"><h3>{label}</h3>\n{body}</div>"
            );
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// File name for a report: `scanlens-<session>.html`.
pub fn report_file_name(session_id: Option<&SessionId>) -> String {
    let stem: String = session_id
        .map(SessionId::as_str)
        .unwrap_or("scan")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("scanlens-{stem}.html")
}

/// Write the report into `dir`, creating it if needed, and return its path.
pub fn write_report(dir: &Path, report: &ScanReport<'_>) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report dir {}", dir.display()))?;
    let path = dir.join(report_file_name(report.session_id));
    fs::write(&path, render_report(report))
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    tracing::info!(path = %path.display(), "report exported");
    Ok(path)
}
