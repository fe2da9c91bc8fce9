//! Create a new content file

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::DATE_FORMAT;
use crate::Site;

/// Create a content file with a complete header under `content/<dir>`
pub fn create_post(site: &Site, title: &str, dir: &str, draft: bool) -> Result<PathBuf> {
    let target_dir = site.content_dir.join(dir);
    fs::create_dir_all(&target_dir)?;

    let filename = format!(
        "{}.{}",
        slug::slugify(title),
        site.config.content_extension
    );
    let file_path = target_dir.join(filename);

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let today = chrono::Local::now().format(DATE_FORMAT);
    let mut content = format!(
        "---\ntitle: {}\ndate: {}\ndescription: \"\"\ntags: []\n",
        serde_yaml::to_string(title)?.trim_end(),
        today
    );
    if draft {
        content.push_str("draft: true\n");
    }
    content.push_str("---\n\n");

    fs::write(&file_path, content)?;
    tracing::debug!("Created {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FrontMatter;
    use tempfile::TempDir;

    #[test]
    fn test_create_post() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let path = create_post(&site, "Hello: A \"New\" World", "posts", false).unwrap();
        assert_eq!(path, dir.path().join("content/posts/hello-a-new-world.md"));

        let text = fs::read_to_string(&path).unwrap();
        let (fm, body) = FrontMatter::parse("content/posts/hello-a-new-world.md", &text).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello: A \"New\" World"));
        assert!(fm.parsed_date("x").is_ok());
        assert_eq!(fm.tags, Some(vec![]));
        assert!(!fm.draft);
        assert_eq!(body, "");
    }

    #[test]
    fn test_create_draft_and_refuse_overwrite() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let path = create_post(&site, "Later", "notes", true).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let (fm, _) = FrontMatter::parse("content/notes/later.md", &text).unwrap();
        assert!(fm.draft);

        assert!(create_post(&site, "Later", "notes", false).is_err());
    }
}
