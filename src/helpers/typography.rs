//! Typographic post-processing of rendered HTML fragments

use lazy_static::lazy_static;
use regex::Regex;

use crate::content::markdown::QUOTE_RE;

lazy_static! {
    static ref COMMENT_RE: Regex = Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid");
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("tag pattern is valid");
    static ref TAG_NAME_RE: Regex =
        Regex::new(r"^<\s*(/?)\s*([A-Za-z][A-Za-z0-9-]*)").expect("tag name pattern is valid");
}

/// Elements whose text is left exactly as written
const VERBATIM_TAGS: [&str; 6] = ["pre", "code", "kbd", "script", "style", "math"];

/// Strip comments, then apply smart typography to the text of `html`
pub fn postprocess(html: &str) -> String {
    smarten(&strip_comments(html))
}

/// Remove HTML comments
pub fn strip_comments(html: &str) -> String {
    COMMENT_RE.replace_all(html, "").into_owned()
}

/// Wrap quoted phrases in `<q>`, then curl remaining quotes and convert
/// dashes and ellipses. Tags and verbatim elements pass through unchanged.
pub fn smarten(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut verbatim_depth = 0usize;
    let mut previous: Option<char> = None;
    let mut last = 0;

    for tag in TAG_RE.find_iter(html) {
        push_text(
            &mut out,
            &html[last..tag.start()],
            verbatim_depth > 0,
            &mut previous,
        );
        out.push_str(tag.as_str());
        verbatim_depth = track_verbatim(tag.as_str(), verbatim_depth);
        last = tag.end();
    }
    push_text(&mut out, &html[last..], verbatim_depth > 0, &mut previous);

    out
}

fn push_text(out: &mut String, text: &str, verbatim: bool, previous: &mut Option<char>) {
    if text.is_empty() {
        return;
    }
    if verbatim {
        out.push_str(text);
    } else {
        let text = text.replace("&quot;", "\"");
        out.push_str(&educate(&wrap_quotes(&text), *previous));
    }
    *previous = text.chars().last().or(*previous);
}

/// Adjust the verbatim nesting depth for one tag
fn track_verbatim(tag: &str, depth: usize) -> usize {
    let Some(caps) = TAG_NAME_RE.captures(tag) else {
        return depth;
    };
    let name = caps[2].to_ascii_lowercase();
    if !VERBATIM_TAGS.contains(&name.as_str()) || tag.ends_with("/>") {
        return depth;
    }
    if &caps[1] == "/" {
        depth.saturating_sub(1)
    } else {
        depth + 1
    }
}

/// Rewrite quoted phrases as `<q>` elements
pub fn wrap_quotes(text: &str) -> String {
    QUOTE_RE
        .replace_all(text, |caps: &regex::Captures| {
            let inner = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            format!("<q>{}</q>", inner)
        })
        .into_owned()
}

/// Curl straight quotes and convert `--` and `...`
fn educate(text: &str, previous: Option<char>) -> String {
    let text = text
        .replace("...", "\u{2026}")
        .replace("---", "\u{2014}")
        .replace("--", "\u{2014}");

    let mut out = String::with_capacity(text.len());
    let mut prev = previous;
    for c in text.chars() {
        let opening =
            prev.map_or(true, |p| p.is_whitespace() || "([{\u{2014}\u{2013}-".contains(p));
        match c {
            '"' => out.push(if opening { '\u{201C}' } else { '\u{201D}' }),
            '\'' => out.push(if opening { '\u{2018}' } else { '\u{2019}' }),
            _ => out.push(c),
        }
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        let html = "<p>a<!-- hidden\nmultiline -->b</p><!-- more -->";
        assert_eq!(strip_comments(html), "<p>ab</p>");
    }

    #[test]
    fn test_curl_lone_quotes() {
        assert_eq!(
            smarten("<p>it's a \"trap</p>"),
            "<p>it\u{2019}s a \u{201C}trap</p>"
        );
    }

    #[test]
    fn test_closing_quote_after_tag() {
        assert_eq!(
            smarten("<p>\"<em>so</em>\" he said</p>"),
            "<p>\u{201C}<em>so</em>\u{201D} he said</p>"
        );
    }

    #[test]
    fn test_wraps_quoted_phrases() {
        assert_eq!(
            smarten("<p>He said \"hello\"</p>"),
            "<p>He said <q>hello</q></p>"
        );
        assert_eq!(
            smarten("<p>He said &quot;hello&quot;</p>"),
            "<p>He said <q>hello</q></p>"
        );
    }

    #[test]
    fn test_already_wrapped_is_stable() {
        let html = "<p>He said <q>hello</q> -- twice...</p>";
        let once = postprocess(html);
        assert_eq!(once, "<p>He said <q>hello</q> \u{2014} twice\u{2026}</p>");
        assert_eq!(postprocess(&once), once);
    }

    #[test]
    fn test_attributes_untouched() {
        let html = r#"<a href="/x" title="it's">link</a>"#;
        assert_eq!(smarten(html), html);
    }

    #[test]
    fn test_verbatim_elements_untouched() {
        let html = "<pre><code>let s = \"x\"; // --</code></pre><p>\"y\"</p>";
        assert_eq!(
            smarten(html),
            "<pre><code>let s = \"x\"; // --</code></pre><p><q>y</q></p>"
        );
    }
}
