//! Copy static assets from the content tree into the output tree

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::content::is_hidden;
use crate::Site;

/// Counts from one asset copy pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub copied: usize,
    pub failed: usize,
}

/// Mirror every non-content, non-hidden file under the content root into
/// the output root. Per-file failures are logged and counted.
pub fn copy_assets(site: &Site) -> Result<CopySummary> {
    let source_dir = &site.content_dir;
    let mut summary = CopySummary::default();

    tracing::info!("Copying assets from {:?}...", source_dir);

    for entry in WalkDir::new(source_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error walking {:?}: {}", source_dir, e);
                summary.failed += 1;
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || site.is_content_file(path) {
            continue;
        }

        match copy_one(path, source_dir, &site.output_dir) {
            Ok(dest) => {
                tracing::debug!("Copied {:?} -> {:?}", path, dest);
                summary.copied += 1;
            }
            Err(e) => {
                tracing::warn!("Error copying {:?}: {:#}", path, e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!("Copy complete. {} files copied.", summary.copied);
    Ok(summary)
}

fn copy_one(path: &Path, source_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
    let relative = path.strip_prefix(source_dir)?;
    let dest = output_dir.join(relative);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::copy(path, &dest).with_context(|| format!("Failed to copy to {:?}", dest))?;

    Ok(dest)
}
