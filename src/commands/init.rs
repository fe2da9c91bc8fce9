//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG: &str = r#"# Site
title: My Site

# Directory
content_dir: content
output_dir: dist
templates_dir: templates

# Rendering
page_template: base.html
content_extension: md
page_extension: html
highlight:
  inline_styles: false
  theme: InspiredGitHub
"#;

const BASE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title }} | {{ site_title }}</title>
  {% if meta.description %}<meta name="description" content="{{ meta.description }}">{% endif %}
</head>
<body>
  {% if toc %}<nav class="toc">{{ toc }}</nav>{% endif %}
  <main>{{ content }}</main>
  <footer>Rendered on {{ rendered_on | date(format="%Y-%m-%d") }}</footer>
</body>
</html>
"#;

const INDEX: &str = r#"---
title: Home
---

# Posts

{% for post in list_under(prefix="content/posts") %}
- [{{ post.meta.title }}]({{ relative_url(item=post) }}) ({{ post.meta.date }})
{% endfor %}
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    // Create directory structure
    fs::create_dir_all(target_dir.join("content/posts"))?;
    fs::create_dir_all(target_dir.join("templates"))?;

    write_new(&target_dir.join(CONFIG_FILE), CONFIG)?;
    write_new(&target_dir.join("templates/base.html"), BASE_TEMPLATE)?;
    write_new(&target_dir.join("content/index.md"), INDEX)?;

    // Create a sample post
    let today = chrono::Local::now().format("%Y-%m-%d");
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
description: The first post on this site
tags:
  - welcome
---

Welcome! This is your very first post.

## Quick Start

Build the site:

```bash
$ marksite build
```

Every page is written to `dist/`, and everything else under `content/` is copied as-is.
"#,
        today
    );

    write_new(
        &target_dir.join("content/posts/hello-world.md"),
        &sample_post,
    )?;

    Ok(())
}

/// Write a file unless it already exists
fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created {:?}", path);
    Ok(())
}
