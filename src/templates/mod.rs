//! Template expansion with Tera
//!
//! Page bodies and the shared page template are expanded by the same
//! engine. Besides plain variables, templates can reach the registry only
//! through two functions:
//!
//! - `list_under(prefix="content/posts")`: items under a source path
//!   prefix, newest first, index pages excluded
//! - `relative_url(item=post)`: an item's output path relative to the
//!   output root
//!
//! Heading attribute blocks such as `## Setup {#setup}` would otherwise
//! open a tera comment; they are set aside before expansion and put back
//! afterwards.

use anyhow::{Context as _, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, Tera, Value};

use crate::content::{ContentItem, Registry};
use crate::error::BuildError;

lazy_static! {
    /// An ATX heading ending in a `{#id ...}` attribute block. Blocks that
    /// close with `#}` are tera comments and are left alone.
    static ref HEADING_ATTRS_RE: Regex =
        Regex::new(r"(?m)^([ ]{0,3}#{1,6}[ \t].*?)\{(#[^}\n]*[^#}\s])\}([ \t]*)$")
            .expect("heading attribute pattern is valid");
}

/// Stands in for the opening brace of a heading attribute block
const ATTR_BRACE: char = '\u{E000}';

/// Template renderer bound to one build's registry
pub struct TemplateRenderer {
    tera: Tera,
    page_template: String,
}

impl TemplateRenderer {
    /// Load every `.html` template under `templates_dir`
    pub fn new(templates_dir: &Path, page_template: &str, registry: Arc<Registry>) -> Result<Self> {
        if !templates_dir.is_dir() {
            anyhow::bail!("Templates directory not found: {:?}", templates_dir);
        }

        let pattern = format!("{}/**/*.html", templates_dir.display());
        let tera = Tera::new(&pattern)
            .with_context(|| format!("failed to load templates from {:?}", templates_dir))?;

        Self::with_tera(tera, page_template, registry)
    }

    /// Build a renderer around a single in-memory page template
    pub fn from_source(
        page_template: &str,
        source: &str,
        registry: Arc<Registry>,
    ) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(page_template, source)?;
        Self::with_tera(tera, page_template, registry)
    }

    fn with_tera(mut tera: Tera, page_template: &str, registry: Arc<Registry>) -> Result<Self> {
        if !tera.get_template_names().any(|name| name == page_template) {
            anyhow::bail!("Page template {:?} not found", page_template);
        }

        // Pages are assembled from HTML fragments; nothing is escaped
        tera.autoescape_on(vec![]);

        tera.register_function("list_under", list_under(Arc::clone(&registry)));
        tera.register_function("relative_url", relative_url(registry));

        Ok(Self {
            tera,
            page_template: page_template.to_string(),
        })
    }

    /// Expand template syntax embedded in an item's body
    pub fn expand_body(
        &mut self,
        item: &ContentItem,
        context: &Context,
    ) -> Result<String, BuildError> {
        let body = hide_heading_attrs(&item.raw_body);
        let expanded = self
            .tera
            .render_str(&body, context)
            .map_err(|e| BuildError::template(&item.source_path, &e))?;
        Ok(expanded.replace(ATTR_BRACE, "{"))
    }

    /// Render the shared page template for an item
    pub fn render_page(&self, item: &ContentItem, context: &Context) -> Result<String, BuildError> {
        self.tera
            .render(&self.page_template, context)
            .map_err(|e| BuildError::template(&item.source_path, &e))
    }
}

/// Swap the opening brace of heading attribute blocks for a placeholder
fn hide_heading_attrs(body: &str) -> Cow<'_, str> {
    HEADING_ATTRS_RE.replace_all(body, |caps: &Captures| {
        format!("{}{}{}}}{}", &caps[1], ATTR_BRACE, &caps[2], &caps[3])
    })
}

/// Tera function: `list_under(prefix=...)`
fn list_under(registry: Arc<Registry>) -> impl tera::Function {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let prefix = match args.get("prefix") {
            Some(val) => tera::try_get_value!("list_under", "prefix", String, val),
            None => return Err("list_under: missing `prefix` argument".into()),
        };

        let items = registry
            .list_under(&prefix)
            .map_err(|e| tera::Error::msg(format!("list_under: {}", e)))?;

        Ok(tera::to_value(items)?)
    }
}

/// Tera function: `relative_url(item=...)`, where `item` is a listed item
/// or a source path
fn relative_url(registry: Arc<Registry>) -> impl tera::Function {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let source_path = match args.get("item") {
            Some(Value::String(path)) => path.as_str(),
            Some(Value::Object(item)) => item
                .get("source_path")
                .and_then(Value::as_str)
                .ok_or("relative_url: `item` has no `source_path`")?,
            Some(_) => return Err("relative_url: `item` must be an item or a source path".into()),
            None => return Err("relative_url: missing `item` argument".into()),
        };

        let url = registry
            .relative_url(source_path)
            .map_err(|e| tera::Error::msg(format!("relative_url: {}", e)))?;

        Ok(Value::String(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::FrontMatter;

    fn item(relative: &str, title: &str, date: &str, body: &str) -> ContentItem {
        let front_matter = FrontMatter {
            title: Some(title.to_string()),
            date: Some(date.to_string()),
            description: Some(String::new()),
            tags: Some(Vec::new()),
            ..Default::default()
        };
        ContentItem::new(
            &SiteConfig::default(),
            Path::new(relative),
            front_matter,
            body,
        )
    }

    fn renderer(items: Vec<ContentItem>) -> TemplateRenderer {
        let registry = Arc::new(items.into_iter().collect::<Registry>());
        TemplateRenderer::from_source(
            "base.html",
            "<title>{{ title }}</title>{{ toc }}<main>{{ content }}</main>",
            registry,
        )
        .unwrap()
    }

    #[test]
    fn test_expand_body_lists_posts() {
        let listing = item(
            "posts/index.md",
            "Posts",
            "2024-01-01",
            "{% for post in list_under(prefix=\"content/posts\") %}\
             - [{{ post.meta.title }}]({{ relative_url(item=post) }})\n{% endfor %}",
        );
        let mut renderer = renderer(vec![
            listing.clone(),
            item("posts/a.md", "Alpha", "2024-01-01", ""),
            item("posts/b.md", "Beta", "2024-02-01", ""),
        ]);

        let expanded = renderer.expand_body(&listing, &Context::new()).unwrap();
        assert_eq!(
            expanded,
            "- [Beta](posts/b.html)\n- [Alpha](posts/a.html)\n"
        );
    }

    #[test]
    fn test_relative_url_accepts_source_path() {
        let page = item(
            "about.md",
            "About",
            "2024-01-01",
            "{{ relative_url(item=\"content/about.md\") }}",
        );
        let mut renderer = renderer(vec![page.clone()]);
        assert_eq!(
            renderer.expand_body(&page, &Context::new()).unwrap(),
            "about.html"
        );
    }

    #[test]
    fn test_expansion_errors_name_the_file() {
        let page = item("broken.md", "Broken", "2024-01-01", "{{ missing_variable }}");
        let mut renderer = renderer(vec![page.clone()]);
        let err = renderer.expand_body(&page, &Context::new()).unwrap_err();
        assert!(matches!(err, BuildError::Template { .. }));
        assert!(err.to_string().starts_with("content/broken.md"));

        let page = item("bad.md", "Bad", "2024-01-01", "{{ relative_url(item=\"nope.md\") }}");
        let err = renderer.expand_body(&page, &Context::new()).unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }

    #[test]
    fn test_heading_attributes_survive_expansion() {
        let page = item(
            "a.md",
            "Alpha",
            "2024-01-01",
            "## Setup {#getting-started}\n\n### {{ title }} {#named .wide}\n\n## Notes {# hidden #}",
        );
        let mut renderer = renderer(vec![page.clone()]);
        let mut context = Context::new();
        context.insert("title", "Alpha");

        assert_eq!(
            renderer.expand_body(&page, &context).unwrap(),
            "## Setup {#getting-started}\n\n### Alpha {#named .wide}\n\n## Notes "
        );
    }

    #[test]
    fn test_hide_heading_attrs_only_touches_headings() {
        let body = "text {#not-a-heading}\n## H {#h}\n#nospace {#x}";
        assert_eq!(
            hide_heading_attrs(body),
            format!("text {{#not-a-heading}}\n## H {}#h}}\n#nospace {{#x}}", ATTR_BRACE)
        );
    }

    #[test]
    fn test_render_page() {
        let page = item("a.md", "Alpha", "2024-01-01", "");
        let renderer = renderer(vec![page.clone()]);
        let mut context = Context::new();
        context.insert("title", "Alpha");
        context.insert("toc", "<ul></ul>");
        context.insert("content", "<p>\"raw\" & <b>html</b></p>");
        assert_eq!(
            renderer.render_page(&page, &context).unwrap(),
            "<title>Alpha</title><ul></ul><main><p>\"raw\" & <b>html</b></p></main>"
        );
    }

    #[test]
    fn test_missing_page_template() {
        let registry = Arc::new(Registry::default());
        let mut tera = Tera::default();
        tera.add_raw_template("other.html", "x").unwrap();
        assert!(TemplateRenderer::with_tera(tera, "base.html", registry).is_err());
    }
}
