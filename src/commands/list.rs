//! List registered content

use anyhow::Result;

use crate::content::Registry;
use crate::Site;

/// Print the items under `prefix`, newest first, with their output paths
pub fn run(site: &Site, prefix: Option<&str>) -> Result<()> {
    let (registry, _) = Registry::build(site)?;
    let prefix = prefix.unwrap_or(&site.config.content_dir);

    let items = registry.list_under(prefix)?;
    println!("Items under {} ({}):", prefix, items.len());
    for item in items {
        println!(
            "  {} - {} [{} -> {}]",
            item.front_matter.date.as_deref().unwrap_or_default(),
            item.front_matter.title.as_deref().unwrap_or("Untitled"),
            item.source_path,
            item.url
        );
    }

    Ok(())
}
