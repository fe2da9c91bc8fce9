//! Content item model

use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::frontmatter::{FrontMatter, Metadata};
use crate::config::SiteConfig;
use crate::error::BuildError;

/// Basename (without extension) that marks a section landing page
pub const INDEX_STEM: &str = "index";

/// One content file, as discovered during the registry scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    /// Source path, `<content_dir>/<relative path>` with `/` separators
    pub source_path: String,

    /// Destination path, `<output_dir>/<relative path>.<page extension>`
    pub output_path: PathBuf,

    /// Destination relative to the output root, `/`-separated
    pub url: String,

    /// Header block as declared
    #[serde(rename = "meta")]
    pub front_matter: FrontMatter,

    /// Body text after the header, trimmed
    #[serde(skip)]
    pub raw_body: String,

    /// Section landing page, excluded from listings
    pub is_index: bool,
}

impl ContentItem {
    /// Create an item for the file at `relative` (relative to the content root)
    pub fn new(
        config: &SiteConfig,
        relative: &Path,
        front_matter: FrontMatter,
        raw_body: &str,
    ) -> Self {
        let is_index = relative
            .file_stem()
            .map(|stem| stem == INDEX_STEM)
            .unwrap_or(false);

        Self {
            source_path: source_path_for(&config.content_dir, relative),
            output_path: output_path_for(&config.output_dir, relative, &config.page_extension),
            url: url_for(relative, &config.page_extension),
            front_matter,
            raw_body: raw_body.to_string(),
            is_index,
        }
    }

    /// Validated metadata for a full render
    pub fn metadata(&self) -> Result<Metadata, BuildError> {
        self.front_matter.validate(&self.source_path, !self.is_index)
    }

    /// Parsed date, required for chronological listings
    pub fn date(&self) -> Result<NaiveDate, BuildError> {
        self.front_matter.parsed_date(&self.source_path)
    }
}

/// Join path components with `/` regardless of platform
fn slash_join(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Registry key for a file at `relative` under the content root
pub fn source_path_for(content_dir: &str, relative: &Path) -> String {
    let root = content_dir.trim_end_matches('/');
    let relative = slash_join(relative);
    if root.is_empty() {
        relative
    } else {
        format!("{}/{}", root, relative)
    }
}

/// Output path for a file at `relative` under the content root.
///
/// Files at the root land directly in the output root, nested files keep
/// their directories.
pub fn output_path_for(output_dir: &str, relative: &Path, page_extension: &str) -> PathBuf {
    Path::new(output_dir).join(relative.with_extension(page_extension))
}

/// Output path relative to the output root, suitable as a link target
pub fn url_for(relative: &Path, page_extension: &str) -> String {
    slash_join(&relative.with_extension(page_extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(relative: &str) -> ContentItem {
        ContentItem::new(
            &SiteConfig::default(),
            Path::new(relative),
            FrontMatter::default(),
            "body",
        )
    }

    #[test]
    fn test_root_file_is_flattened() {
        let item = item("a.md");
        assert_eq!(item.source_path, "content/a.md");
        assert_eq!(item.output_path, PathBuf::from("dist/a.html"));
        assert_eq!(item.url, "a.html");
    }

    #[test]
    fn test_nested_file_keeps_directories() {
        let item = item("posts/2024/x.md");
        assert_eq!(item.source_path, "content/posts/2024/x.md");
        assert_eq!(item.output_path, PathBuf::from("dist/posts/2024/x.html"));
        assert_eq!(item.url, "posts/2024/x.html");
    }

    #[test]
    fn test_index_flag() {
        assert!(item("index.md").is_index);
        assert!(item("posts/index.md").is_index);
        assert!(!item("posts/reindex.md").is_index);
        assert!(!item("posts/index-of-things.md").is_index);
    }

    #[test]
    fn test_index_metadata_is_lenient() {
        let mut index = item("posts/index.md");
        index.front_matter.title = Some("Posts".to_string());
        assert_eq!(index.metadata().unwrap().title, "Posts");

        let mut post = item("posts/x.md");
        post.front_matter.title = Some("X".to_string());
        assert!(matches!(
            post.metadata(),
            Err(BuildError::MissingField { field: "date", .. })
        ));
    }
}
