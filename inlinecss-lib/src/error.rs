use thiserror::Error;

/// A selector the query engine could not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

impl SelectorError {
    pub fn new(selector: &str, reason: impl Into<String>) -> Self {
        SelectorError {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InlineError {
    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("failed to write HTML: {0}")]
    Io(#[from] std::io::Error),
}
