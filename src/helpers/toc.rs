//! Table of contents rendering

use crate::content::markdown::html_escape;
use crate::content::TocEntry;

/// Render headings as nested `<ul>` lists following their levels.
///
/// Returns an empty string for a document without headings.
pub fn render_toc(entries: &[TocEntry]) -> String {
    let Some(first) = entries.first() else {
        return String::new();
    };

    let mut html = String::from("<ul>\n");
    // Levels of the currently open lists, outermost first
    let mut open: Vec<u8> = vec![first.level];

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            let current = open.last().copied().unwrap_or(entry.level);
            if entry.level > current {
                html.push_str("\n<ul>\n");
                open.push(entry.level);
            } else {
                html.push_str("</li>\n");
                while open.len() > 1 && open.last().is_some_and(|&level| entry.level < level) {
                    html.push_str("</ul>\n</li>\n");
                    open.pop();
                }
            }
        }
        html.push_str(&format!(
            r##"<li><a href="#{}">{}</a>"##,
            entry.id,
            html_escape(&entry.text)
        ));
    }

    html.push_str("</li>\n");
    for _ in 1..open.len() {
        html.push_str("</ul>\n</li>\n");
    }
    html.push_str("</ul>\n");
    html
}
