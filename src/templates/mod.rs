//! Site templates rendered with Tera
//!
//! Templates are embedded in the binary. Output is escaped with
//! [`html_escape`] except section HTML, which the rich text renderer already
//! sanitized and the templates mark `safe`.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::helpers::html_escape;
use crate::view::{DetailViewModel, ListItem, ListViewModel, StatusViewModel};

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with all site templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.set_escape_fn(html_escape);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("status.html", include_str!("site/status.html")),
            // Partials
            (
                "partials/post_list.html",
                include_str!("site/partials/post_list.html"),
            ),
            (
                "partials/load_more.html",
                include_str!("site/partials/load_more.html"),
            ),
            (
                "partials/preview_exit.html",
                include_str!("site/partials/preview_exit.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    fn render_page<T: Serialize>(
        &self,
        template_name: &str,
        site_title: &str,
        vm: &T,
    ) -> Result<String> {
        let mut context = Context::from_serialize(vm)?;
        context.insert("site_title", site_title);
        self.render(template_name, &context)
    }

    /// Home page
    pub fn render_list(&self, site_title: &str, vm: &ListViewModel) -> Result<String> {
        self.render_page("index.html", site_title, vm)
    }

    /// Feed entries alone, as appended by the load-more control
    pub fn render_posts(&self, posts: &[ListItem]) -> Result<String> {
        let mut context = Context::new();
        context.insert("posts", posts);
        self.render("partials/post_list.html", &context)
    }

    /// Post page
    pub fn render_detail(&self, site_title: &str, vm: &DetailViewModel) -> Result<String> {
        self.render_page("post.html", site_title, vm)
    }

    /// Loading, not-found and error pages
    pub fn render_status(&self, site_title: &str, vm: &StatusViewModel) -> Result<String> {
        self.render_page("status.html", site_title, vm)
    }
}
