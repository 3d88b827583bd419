//! spacetraveling: a blog engine backed by a headless CMS
//!
//! Posts live in an external content repository. This crate reads them
//! through the [`source::ContentSource`] interface, paginates the feed,
//! resolves chronological neighbors, estimates reading time, gates draft
//! content behind preview cookies and renders the result as HTML.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod neighbors;
pub mod pagination;
pub mod preview;
pub mod server;
pub mod source;
pub mod templates;
pub mod view;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use source::{ContentSource, HttpContentSource, MemoryContentSource};

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Where posts are read from
    pub source: Arc<dyn ContentSource>,
    /// Preview cookie reader/writer
    pub gate: preview::PreviewGate,
}

impl Blog {
    /// Create a blog from a directory holding `_config.yml`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        let source: Arc<dyn ContentSource> = match &config.content.fixtures {
            Some(fixtures) => {
                let path = base_dir.join(fixtures);
                tracing::info!("Reading content from fixtures {:?}", path);
                Arc::new(MemoryContentSource::from_file(&path)?)
            }
            None => {
                tracing::info!("Reading content from {}", config.content.endpoint);
                Arc::new(HttpContentSource::new(&config.content)?)
            }
        };

        Ok(Self::with_source(config, source))
    }

    /// Create a blog over an explicit content source
    pub fn with_source(config: config::SiteConfig, source: Arc<dyn ContentSource>) -> Self {
        let gate = preview::PreviewGate::new(&config.preview);
        Self {
            config,
            source,
            gate,
        }
    }

    /// Content loader bound to this blog
    pub fn loader(&self) -> content::ContentLoader<'_> {
        content::ContentLoader::new(self)
    }

    /// Presentation assembler configured for this blog
    pub fn presenter(&self) -> view::Presenter {
        view::Presenter::new(&self.config)
    }

    /// Custom type holding posts
    pub fn doc_type(&self) -> &str {
        &self.config.content.document_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_with_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Fixture Blog\ncontent:\n  fixtures: content.json\n",
        )
        .unwrap();
        fs::write(dir.path().join("content.json"), r#"{"documents": []}"#).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Fixture Blog");
        assert_eq!(blog.doc_type(), "post");
    }

    #[test]
    fn test_missing_fixtures_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "content:\n  fixtures: missing.json\n",
        )
        .unwrap();

        assert!(Blog::new(dir.path()).is_err());
    }
}
