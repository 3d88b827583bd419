//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `content.endpoint`
pub const ENV_API_ENDPOINT: &str = "SPACETRAVELING_API_ENDPOINT";
/// Environment variable overriding `content.access_token`
pub const ENV_ACCESS_TOKEN: &str = "SPACETRAVELING_ACCESS_TOKEN";
/// Environment variable overriding `preview.secret`
pub const ENV_PREVIEW_SECRET: &str = "SPACETRAVELING_PREVIEW_SECRET";

/// Placeholder preview secret shipped in the default configuration
pub const DEFAULT_PREVIEW_SECRET: &str = "change-me";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,
    pub url: String,

    // Date / Time format (Moment.js tokens)
    pub date_format: String,
    pub time_format: String,

    // Listing
    pub per_page: usize,
    pub words_per_minute: usize,

    // Rendering
    pub revalidate_secs: u64,
    pub fetch_timeout_ms: u64,

    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "en_US".to_string(),
            timezone: String::new(),
            url: "http://localhost:3000".to_string(),

            date_format: "DD MMM YYYY".to_string(),
            time_format: "HH:mm".to_string(),

            per_page: 5,
            words_per_minute: 200,

            revalidate_secs: 60 * 30,
            fetch_timeout_ms: 3000,

            content: ContentConfig::default(),
            preview: PreviewConfig::default(),
            comments: CommentsConfig::default(),
            labels: LabelsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_API_ENDPOINT).filter(|v| !v.is_empty()) {
            tracing::debug!("Content endpoint overridden from {}", ENV_API_ENDPOINT);
            self.content.endpoint = endpoint;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            self.content.access_token = Some(token);
        }
        if let Some(secret) = lookup(ENV_PREVIEW_SECRET).filter(|v| !v.is_empty()) {
            self.preview.secret = secret;
        }
    }

    /// Reading speed, falling back to 200 words per minute when unset
    pub fn reading_speed(&self) -> usize {
        if self.words_per_minute == 0 {
            crate::content::DEFAULT_WORDS_PER_MINUTE
        } else {
            self.words_per_minute
        }
    }
}

/// Content source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// API endpoint of the content repository
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding blog posts
    pub document_type: String,
    /// JSON fixtures file; when set, the HTTP endpoint is not used
    pub fixtures: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "post".to_string(),
            fixtures: None,
        }
    }
}

/// Preview mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub cookie_name: String,
    /// Key used to sign the preview cookie
    pub secret: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cookie_name: "spacetraveling.preview".to_string(),
            secret: DEFAULT_PREVIEW_SECRET.to_string(),
        }
    }
}

impl PreviewConfig {
    /// Whether the cookie key is still the shipped placeholder (or empty)
    pub fn has_default_secret(&self) -> bool {
        self.secret.is_empty() || self.secret == DEFAULT_PREVIEW_SECRET
    }
}

/// Utterances comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: false,
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

/// User-facing strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub load_more: String,
    pub edited_on: String,
    pub at: String,
    pub exit_preview: String,
    pub loading: String,
    pub not_found: String,
    pub fetch_failed: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            load_more: "Load more posts".to_string(),
            edited_on: "edited on".to_string(),
            at: "at".to_string(),
            exit_preview: "Exit preview mode".to_string(),
            loading: "Loading...".to_string(),
            not_found: "Post not found".to_string(),
            fetch_failed: "Could not reach the content service".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.per_page, 5);
        assert_eq!(config.words_per_minute, 200);
        assert_eq!(config.content.document_type, "post");
        assert!(!config.comments.enable);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: pt_BR
timezone: America/Sao_Paulo
per_page: 10
content:
  endpoint: https://blog.cdn.prismic.io/api/v2
comments:
  enable: true
  repo: someone/blog-comments
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.language, "pt_BR");
        assert_eq!(config.per_page, 10);
        assert_eq!(config.content.endpoint, "https://blog.cdn.prismic.io/api/v2");
        // Unspecified nested fields keep their defaults
        assert_eq!(config.content.document_type, "post");
        assert_eq!(config.comments.repo, "someone/blog-comments");
        assert_eq!(config.comments.theme, "github-dark");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: From Disk\nwords_per_minute: 250\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "From Disk");
        assert_eq!(config.reading_speed(), 250);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_ENDPOINT, "https://other.cdn.prismic.io/api/v2"),
            (ENV_ACCESS_TOKEN, "secret-token"),
            (ENV_PREVIEW_SECRET, ""),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.content.endpoint, "https://other.cdn.prismic.io/api/v2");
        assert_eq!(config.content.access_token.as_deref(), Some("secret-token"));
        // Empty values are ignored
        assert_eq!(config.preview.secret, DEFAULT_PREVIEW_SECRET);
    }

    #[test]
    fn test_default_secret_detection() {
        let mut config = SiteConfig::default();
        assert!(config.preview.has_default_secret());

        config.apply_overrides(|key| (key == ENV_PREVIEW_SECRET).then(|| "k3y".to_string()));
        assert!(!config.preview.has_default_secret());

        config.preview.secret.clear();
        assert!(config.preview.has_default_secret());
    }

    #[test]
    fn test_zero_reading_speed_falls_back() {
        let config = SiteConfig {
            words_per_minute: 0,
            ..SiteConfig::default()
        };
        assert_eq!(config.reading_speed(), 200);
    }
}
