//! Helper functions for rendering
//!
//! Date formatting, URL building and small HTML builders used by the
//! listing templates.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
