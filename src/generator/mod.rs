//! Generator module - renders every registry entry to a static HTML page

mod assets;

pub use assets::{copy_assets, CopySummary};

use anyhow::{Context as _, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tera::{Context, Value};

use crate::content::{ContentItem, MarkdownRenderer, Metadata, Registry};
use crate::error::BuildError;
use crate::helpers::{postprocess, render_toc};
use crate::templates::TemplateRenderer;
use crate::Site;

/// Renders content items through body expansion, markdown and the page template
pub struct Generator<'a> {
    site: &'a Site,
    registry: Arc<Registry>,
    /// The registry as templates see it, serialized once per build
    registry_value: Value,
    templates: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl<'a> Generator<'a> {
    /// Create a generator using the site's templates directory
    pub fn new(site: &'a Site, registry: Arc<Registry>) -> Result<Self> {
        let templates = TemplateRenderer::new(
            &site.templates_dir,
            &site.config.page_template,
            Arc::clone(&registry),
        )?;
        Self::with_templates(site, registry, templates)
    }

    /// Create a generator around an already configured template renderer
    pub fn with_templates(
        site: &'a Site,
        registry: Arc<Registry>,
        templates: TemplateRenderer,
    ) -> Result<Self> {
        let registry_value = tera::to_value(&*registry)?;
        let markdown = MarkdownRenderer::with_options(&site.config.highlight);

        Ok(Self {
            site,
            registry,
            registry_value,
            templates,
            markdown,
        })
    }

    /// Render every registry entry to its output path.
    ///
    /// Metadata of all entries is validated before the first page is
    /// written. Any validation or template error aborts the run.
    pub fn render_all(&mut self) -> Result<usize> {
        self.registry.validate()?;

        tracing::info!("Rendering {} files to disk...", self.registry.len());

        let registry = Arc::clone(&self.registry);
        let mut rendered = 0;
        for item in registry.iter() {
            let output_path = self.render_to_file(item)?;
            tracing::debug!("Rendered {} -> {:?}", item.source_path, output_path);
            rendered += 1;
        }

        tracing::info!("Rendering complete. {} files rendered.", rendered);
        Ok(rendered)
    }

    /// Render one item and write it, creating parent directories
    pub fn render_to_file(&mut self, item: &ContentItem) -> Result<PathBuf> {
        let html = self.render_page(item)?;

        let output_path = self.site.base_dir.join(&item.output_path);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;

        Ok(output_path)
    }

    /// Render one item to a complete page
    pub fn render_page(&mut self, item: &ContentItem) -> Result<String, BuildError> {
        let meta = item.metadata()?;
        let mut context = self.base_context(&meta);

        let expanded = self.templates.expand_body(item, &context)?;
        let rendered = self.markdown.render(expanded.trim());

        let content = postprocess(&rendered.html);
        let toc = postprocess(&render_toc(&rendered.toc));

        context.insert("content", &content);
        context.insert("toc", &toc);
        self.templates.render_page(item, &context)
    }

    /// Variables shared by body expansion and the page template
    fn base_context(&self, meta: &Metadata) -> Context {
        let mut context = Context::new();
        context.insert("title", &meta.title);
        context.insert("meta", meta);
        context.insert("rendered_on", &chrono::Local::now().to_rfc3339());
        context.insert("registry", &self.registry_value);
        context.insert("site_title", &self.site.config.title);
        context
    }
}
