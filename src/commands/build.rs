//! Build the static site

use anyhow::Result;
use std::sync::Arc;

use crate::content::{Registry, ScanSummary};
use crate::generator::{self, CopySummary, Generator};
use crate::Site;

/// Counts reported at the end of a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub scan: ScanSummary,
    pub rendered: usize,
    pub assets: CopySummary,
}

/// Build the site: registry, then rendering, then asset copy.
///
/// Each phase finishes before the next starts. Rendering sees the
/// complete registry, so listings are accurate on every page.
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = std::time::Instant::now();
    tracing::info!("Starting site build in {:?}", site.base_dir);

    let (registry, scan) = Registry::build(site)?;
    let registry = Arc::new(registry);

    let mut generator = Generator::new(site, Arc::clone(&registry))?;
    let rendered = generator.render_all()?;

    let assets = generator::copy_assets(site)?;

    let duration = start.elapsed();
    tracing::info!(
        "Site build complete in {:.2}s: {} pages rendered, {} assets copied",
        duration.as_secs_f64(),
        rendered,
        assets.copied
    );

    Ok(BuildReport {
        scan,
        rendered,
        assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BuildError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const BASE: &str = r#"<!doctype html>
<html><head><title>{{ title }} | {{ site_title }}</title></head>
<body><nav>{{ toc }}</nav><main>{{ content }}</main></body></html>
"#;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn post(title: &str, date: &str, body: &str) -> String {
        format!(
            "---\ntitle: {}\ndate: {}\ndescription: {} post\ntags:\n  - notes\n---\n\n{}\n",
            title, date, title, body
        )
    }

    fn site_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "templates/base.html", BASE);
        write(
            root,
            "content/index.md",
            "---\ntitle: Home\n---\n\n# Latest\n\n\
             {% for post in list_under(prefix=\"content/posts\") %}\
             - [{{ post.meta.title }}]({{ relative_url(item=post) }}) {{ post.meta.date }}\n\
             {% endfor %}",
        );
        write(
            root,
            "content/posts/first.md",
            &post("First", "2024-01-10", "## My Title\n\nHe said \"hello\"."),
        );
        write(
            root,
            "content/posts/second.md",
            &post("Second", "2024-03-01", "```klingon\nqapla'\n```"),
        );
        write(
            root,
            "content/posts/same-day.md",
            &post("Same Day", "2024-01-10", "tie"),
        );
        write(
            root,
            "content/posts/wip.md",
            "---\ntitle: WIP\ndraft: true\n---\nnot yet",
        );
        write(root, "content/posts/img/photo.jpg", "\u{1}\u{2}binary");
        dir
    }

    #[test]
    fn test_full_build() {
        let dir = site_fixture();
        let site = Site::new(dir.path()).unwrap();

        let report = run(&site).unwrap();
        assert_eq!(report.scan.registered, 4);
        assert_eq!(report.scan.drafts, 1);
        assert_eq!(report.rendered, 4);
        assert_eq!(report.assets.copied, 1);

        let dist = dir.path().join("dist");
        assert!(dist.join("index.html").is_file());
        assert!(dist.join("posts/first.html").is_file());
        assert!(!dist.join("posts/wip.html").exists());
        assert!(!dist.join("posts/wip.md").exists());

        let index = fs::read_to_string(dist.join("index.html")).unwrap();
        assert!(index.contains("<title>Home | My Site</title>"));
        let second = index.find("posts/second.html").unwrap();
        let first = index.find("posts/first.html").unwrap();
        let same_day = index.find("posts/same-day.html").unwrap();
        assert!(second < first && first < same_day);
        assert!(!index.contains("wip"));

        let first_page = fs::read_to_string(dist.join("posts/first.html")).unwrap();
        assert!(first_page.contains(r#"<h2 id="my-title">My Title</h2>"#));
        assert!(first_page.contains(r##"<a href="#my-title">My Title</a>"##));
        assert!(first_page.contains("He said <q>hello</q>."));

        let second_page = fs::read_to_string(dist.join("posts/second.html")).unwrap();
        assert!(second_page.contains(r#"<div class="highlight">"#));

        assert_eq!(
            fs::read(dist.join("posts/img/photo.jpg")).unwrap(),
            fs::read(dir.path().join("content/posts/img/photo.jpg")).unwrap()
        );
    }

    #[test]
    fn test_build_fails_on_missing_metadata() {
        let dir = site_fixture();
        write(
            dir.path(),
            "content/posts/incomplete.md",
            "---\ntitle: Incomplete\ndate: 2024-01-01\ntags: [a]\n---\nbody",
        );
        let site = Site::new(dir.path()).unwrap();

        let err = run(&site).unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::MissingField { path, field }) => {
                assert_eq!(path, "content/posts/incomplete.md");
                assert_eq!(*field, "description");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_build_fails_on_bad_date() {
        let dir = site_fixture();
        write(
            dir.path(),
            "content/posts/bad-date.md",
            &post("Bad", "January 5th", "body"),
        );
        let site = Site::new(dir.path()).unwrap();

        let err = run(&site).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let dir = site_fixture();
        let site = Site::new(dir.path()).unwrap();

        run(&site).unwrap();
        let first = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        run(&site).unwrap();
        let second = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert_eq!(first, second);
    }
}
