//! Helper functions shared by the content pipeline

mod html;
mod text;

pub use html::*;
pub use text::*;
