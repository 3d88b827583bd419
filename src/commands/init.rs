//! Initialize a new blog

use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::Path;

const FIXTURES_FILE: &str = "content.json";

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }

    let config_content = format!(
        r#"# spacetraveling configuration

# Site
title: spacetraveling
language: en_US
timezone: ''
url: http://localhost:3000

# Date / Time format (Moment.js tokens)
date_format: DD MMM YYYY
time_format: HH:mm

# Feed
per_page: 5
words_per_minute: 200

# Rendering
revalidate_secs: 1800
fetch_timeout_ms: 3000

# Content repository
# SPACETRAVELING_API_ENDPOINT and SPACETRAVELING_ACCESS_TOKEN override these
content:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  document_type: post
  # Remove to read from the endpoint above
  fixtures: {fixtures}

# Preview mode
# SPACETRAVELING_PREVIEW_SECRET overrides the secret
preview:
  cookie_name: spacetraveling.preview
  secret: change-me

# Utterances comments
comments:
  enable: false
  repo: ''
  issue_term: pathname
  theme: github-dark
"#,
        fixtures = FIXTURES_FILE
    );
    fs::write(&config_path, config_content)?;

    let now = chrono::Utc::now().to_rfc3339();
    let fixtures = json!({
        "documents": [
            {
                "id": "hello-world-id",
                "uid": "hello-world",
                "type": "post",
                "first_publication_date": now,
                "last_publication_date": now,
                "data": {
                    "title": "Hello World",
                    "subtitle": "Your very first post",
                    "author": "spacetraveling",
                    "banner": { "url": "" },
                    "content": [
                        {
                            "heading": "Quick start",
                            "body": [
                                {
                                    "type": "paragraph",
                                    "text": "Edit content.json or point the content endpoint at your repository, then run spacetraveling server.",
                                    "spans": [
                                        { "start": 77, "end": 98, "type": "strong" }
                                    ]
                                }
                            ]
                        }
                    ]
                }
            }
        ],
        "previews": {}
    });
    fs::write(
        target_dir.join(FIXTURES_FILE),
        serde_json::to_string_pretty(&fixtures)?,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Blog;

    #[tokio::test]
    async fn test_init_creates_a_loadable_blog() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.content.fixtures.as_deref(), Some(FIXTURES_FILE));

        let post = blog
            .loader()
            .load_post("hello-world", &crate::preview::PreviewSession::inactive())
            .await
            .unwrap();
        assert_eq!(post.summary.title, "Hello World");
        assert_eq!(post.reading_time_minutes, 1);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
