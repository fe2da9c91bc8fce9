//! Markdown rendering with syntax highlighting and heading anchors

use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashMap;
use syntect::highlighting::ThemeSet;
use syntect::html::{highlighted_html_for_string, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::config::HighlightConfig;

lazy_static! {
    /// A phrase in straight or curly double quotes
    pub static ref QUOTE_RE: Regex =
        Regex::new(r#""([^"]+)"|“([^”]+)”"#).expect("quote pattern is valid");
}

/// Characters kept verbatim in heading ids, besides ASCII alphanumerics
const HEADING_ID_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// One heading of a rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Output of a single markdown parse
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub html: String,
    /// Headings in document order; ids match the anchors in `html`
    pub toc: Vec<TocEntry>,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    inline_styles: bool,
}

struct OpenCodeBlock {
    lang: Option<String>,
    source: String,
}

struct OpenHeading {
    /// Index of the heading's start event in the output
    start: usize,
    explicit_id: Option<String>,
    text: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            inline_styles: config.inline_styles,
        }
    }

    /// Render markdown to HTML, collecting headings from the same parse
    pub fn render(&self, markdown: &str) -> RenderedMarkdown {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_DEFINITION_LIST
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut toc: Vec<TocEntry> = Vec::new();
        let mut used_ids: HashMap<String, usize> = HashMap::new();
        let mut code_block: Option<OpenCodeBlock> = None;
        let mut heading: Option<OpenHeading> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some(OpenCodeBlock {
                        lang: fence_language(&kind),
                        source: String::new(),
                    });
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code_block.take() {
                        let highlighted = self.highlight_code(&block.source, block.lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some(block) = code_block.as_mut() {
                        block.source.push_str(&text);
                    }
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    heading = Some(OpenHeading {
                        start: events.len(),
                        explicit_id: id.map(|id| id.to_string()),
                        text: String::new(),
                    });
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id: None,
                        classes,
                        attrs,
                    }));
                }
                Event::End(TagEnd::Heading(level)) => {
                    if let Some(open) = heading.take() {
                        let text = open.text.trim().to_string();
                        let id = unique_id(
                            open.explicit_id.unwrap_or_else(|| heading_id(&text)),
                            &mut used_ids,
                        );
                        if let Some(Event::Start(Tag::Heading { id: slot, .. })) =
                            events.get_mut(open.start)
                        {
                            *slot = Some(CowStr::from(id.clone()));
                        }
                        toc.push(TocEntry {
                            level: level as u8,
                            id,
                            text,
                        });
                    }
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                Event::Text(text) => {
                    if let Some(open) = heading.as_mut() {
                        open.text.push_str(&text);
                    }
                    push_text(&mut events, text);
                }
                Event::Code(code) => {
                    if let Some(open) = heading.as_mut() {
                        open.text.push_str(&code);
                    }
                    events.push(Event::Code(code));
                }
                _ => events.push(event),
            }
        }

        // Image alt text is written as an escaped attribute, so it keeps
        // its quotes as they are
        let mut image_depth = 0usize;
        let events = events.into_iter().flat_map(move |event| {
            match &event {
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
                _ => {}
            }
            if image_depth > 0 {
                vec![event]
            } else {
                wrap_quotes_in_event(event)
            }
        });

        let mut html_output = String::new();
        html::push_html(&mut html_output, events);

        RenderedMarkdown {
            html: html_output,
            toc,
        }
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>\n", html_escape(code));
        };

        let syntax = self.find_syntax(lang);
        let code = format!("{}\n", code.trim());

        let highlighted = if self.inline_styles {
            self.highlight_inline(&code, syntax)
        } else {
            self.highlight_classed(&code, syntax)
        };

        match highlighted {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Highlighting {} failed, emitting plain code: {}", lang, e);
                format!(
                    "<div class=\"highlight\"><pre><code>{}</code></pre></div>\n",
                    html_escape(&code)
                )
            }
        }
    }

    /// Look up a language by token, then extension, else plain text
    fn find_syntax(&self, lang: &str) -> &SyntaxReference {
        self.syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| {
                tracing::debug!("Unknown language {:?}, highlighting as plain text", lang);
                self.syntax_set.find_syntax_plain_text()
            })
    }

    fn highlight_classed(
        &self,
        code: &str,
        syntax: &SyntaxReference,
    ) -> Result<String, syntect::Error> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(format!(
            "<div class=\"highlight\"><pre>{}</pre></div>\n",
            generator.finalize()
        ))
    }

    fn highlight_inline(
        &self,
        code: &str,
        syntax: &SyntaxReference,
    ) -> Result<String, syntect::Error> {
        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        match theme {
            Some(theme) => Ok(format!(
                "<div class=\"highlight\">{}</div>\n",
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme)?
            )),
            None => self.highlight_classed(code, syntax),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Language named by a fenced block's info string, if any
fn fence_language(kind: &CodeBlockKind) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
            .next()
            .filter(|lang| !lang.is_empty())
            .map(str::to_string),
        CodeBlockKind::Indented => None,
    }
}

/// Anchor id for a heading: lowercased, spaces to hyphens, percent-encoded
pub fn heading_id(text: &str) -> String {
    let slug = text.to_lowercase().replace(' ', "-");
    utf8_percent_encode(&slug, HEADING_ID_SET).to_string()
}

/// Suffix repeated ids with `-1`, `-2`, ... so anchors stay unique
fn unique_id(id: String, used: &mut HashMap<String, usize>) -> String {
    let count = used.entry(id.clone()).or_insert(0);
    let unique = if *count == 0 {
        id
    } else {
        format!("{}-{}", id, count)
    };
    *count += 1;
    unique
}

/// Append text, merging with a preceding text event so quoted phrases
/// split by the parser are seen whole
fn push_text<'a>(events: &mut Vec<Event<'a>>, text: CowStr<'a>) {
    if let Some(Event::Text(previous)) = events.last_mut() {
        let merged = format!("{}{}", previous, text);
        *previous = CowStr::from(merged);
    } else {
        events.push(Event::Text(text));
    }
}

/// Rewrite quoted phrases in a text event as `<q>` elements
fn wrap_quotes_in_event(event: Event<'_>) -> Vec<Event<'_>> {
    let Event::Text(text) = event else {
        return vec![event];
    };
    if !QUOTE_RE.is_match(&text) {
        return vec![Event::Text(text)];
    }

    let mut out = Vec::new();
    let mut last = 0;
    for caps in QUOTE_RE.captures_iter(&text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1).or_else(|| caps.get(2)))
        else {
            continue;
        };
        if whole.start() > last {
            out.push(Event::Text(CowStr::from(text[last..whole.start()].to_string())));
        }
        out.push(Event::InlineHtml(CowStr::Borrowed("<q>")));
        out.push(Event::Text(CowStr::from(inner.as_str().to_string())));
        out.push(Event::InlineHtml(CowStr::Borrowed("</q>")));
        last = whole.end();
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
    out
}

/// Simple HTML escaping
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
