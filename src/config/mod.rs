//! Configuration module

mod site;

pub use site::SiteConfig;
pub use site::CommentsConfig;
pub use site::ContentConfig;
pub use site::LabelsConfig;
pub use site::PreviewConfig;
pub use site::{DEFAULT_PREVIEW_SECRET, ENV_ACCESS_TOKEN, ENV_API_ENDPOINT, ENV_PREVIEW_SECRET};
