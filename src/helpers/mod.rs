//! Helper functions shared by the normalizer, templates and generator

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
