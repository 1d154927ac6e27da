//! Moves the rules of a document's `<style>` blocks onto the `style`
//! attributes of the elements they match.

pub mod convert;
pub mod dom;
pub mod error;
pub mod parser;
pub mod style;

pub use convert::style_to_inline::convert;
pub use error::{InlineError, SelectorError};
