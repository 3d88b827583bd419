//! Helper functions shared by the view layer and the templates

mod date;
mod html;

pub use date::*;
pub use html::*;
