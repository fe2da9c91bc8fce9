//! Content module - header parsing, the content registry and markdown rendering

mod frontmatter;
mod item;
pub mod markdown;
mod registry;

pub use frontmatter::{parse_date, split_header, FrontMatter, Metadata, DATE_FORMAT};
pub use item::{output_path_for, source_path_for, url_for, ContentItem};
pub use markdown::{MarkdownRenderer, RenderedMarkdown, TocEntry};
pub use registry::{Registry, ScanSummary};

pub(crate) use registry::is_hidden;
