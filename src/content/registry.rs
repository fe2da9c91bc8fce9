//! Content registry - every renderable content file, keyed by source path

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use super::{ContentItem, FrontMatter};
use crate::error::BuildError;
use crate::Site;

/// Counts from one registry scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub registered: usize,
    pub drafts: usize,
    pub failed: usize,
}

/// All non-draft content items of one build
///
/// Insertion order follows a name-sorted walk of the content tree, so
/// ties in [`Registry::list_under`] resolve the same way on every run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Registry {
    items: IndexMap<String, ContentItem>,
}

impl Registry {
    /// Walk the site's content tree and register every content file.
    ///
    /// Unreadable files and malformed headers are logged and skipped;
    /// drafts never enter the registry.
    pub fn build(site: &Site) -> Result<(Self, ScanSummary)> {
        let content_dir = &site.content_dir;
        if !content_dir.is_dir() {
            anyhow::bail!("Content directory not found: {:?}", content_dir);
        }

        tracing::info!("Building content registry from {:?}", content_dir);

        let mut registry = Registry::default();
        let mut summary = ScanSummary::default();

        for entry in WalkDir::new(content_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read entry under {:?}: {}", content_dir, e);
                    summary.failed += 1;
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !site.is_content_file(path) {
                continue;
            }

            let relative = path
                .strip_prefix(content_dir)
                .with_context(|| format!("{:?} is outside {:?}", path, content_dir))?;

            match load_item(site, path, relative) {
                Ok(Some(item)) => {
                    tracing::debug!("Registered: {}", item.source_path);
                    registry.insert(item);
                    summary.registered += 1;
                }
                Ok(None) => {
                    tracing::info!("Skipping draft: {:?}", path);
                    summary.drafts += 1;
                }
                Err(e) => {
                    tracing::warn!("Error processing {:?}: {:#}", path, e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            "Registry complete. Found {} content files ({} drafts skipped, {} failed)",
            summary.registered,
            summary.drafts,
            summary.failed
        );

        Ok((registry, summary))
    }

    /// Insert an item under its own source path
    pub fn insert(&mut self, item: ContentItem) {
        self.items.insert(item.source_path.clone(), item);
    }

    pub fn get(&self, source_path: &str) -> Option<&ContentItem> {
        self.items.get(source_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check every item's metadata for a full render
    pub fn validate(&self) -> Result<(), BuildError> {
        for item in self.iter() {
            item.metadata()?;
        }
        Ok(())
    }

    /// Non-index items whose source path starts with `prefix`, newest first.
    ///
    /// Items sharing a date keep registry order. Any matching item without
    /// a well-formed date is an error.
    pub fn list_under(&self, prefix: &str) -> Result<Vec<&ContentItem>, BuildError> {
        let mut dated = Vec::new();
        for item in self
            .iter()
            .filter(|item| !item.is_index && item.source_path.starts_with(prefix))
        {
            dated.push((item.date()?, item));
        }

        // sort_by is stable
        dated.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(dated.into_iter().map(|(_, item)| item).collect())
    }

    /// Output path of a registered item relative to the output root
    pub fn relative_url(&self, source_path: &str) -> Result<&str, BuildError> {
        self.get(source_path)
            .map(|item| item.url.as_str())
            .ok_or_else(|| BuildError::UnknownItem(source_path.to_string()))
    }
}

impl FromIterator<ContentItem> for Registry {
    fn from_iter<I: IntoIterator<Item = ContentItem>>(iter: I) -> Self {
        let mut registry = Registry::default();
        for item in iter {
            registry.insert(item);
        }
        registry
    }
}

/// Read and parse one content file; `None` for drafts
fn load_item(site: &Site, path: &Path, relative: &Path) -> Result<Option<ContentItem>> {
    let text = fs::read_to_string(path)?;
    let source_path = super::item::source_path_for(&site.config.content_dir, relative);
    let (front_matter, body) = FrontMatter::parse(&source_path, &text)?;

    if front_matter.draft {
        return Ok(None);
    }

    Ok(Some(ContentItem::new(
        &site.config,
        relative,
        front_matter,
        body,
    )))
}

/// Hidden files and directories start with a dot
pub(crate) fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}
