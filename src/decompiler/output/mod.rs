//! Renderers for the assembled declaration tree.
//!
//! Both artifacts are produced from the same `&[ImageOutcome]`, so a declaration appears
//! in the text and the JSON output with identical content.

mod json;
mod text;

pub use json::write_json;
pub use text::{write_text, TextRenderer};
