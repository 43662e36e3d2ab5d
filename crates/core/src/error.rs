use thiserror::Error;

/// Reasons a request's study material is rejected before any work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("content is missing")]
    Missing,

    #[error("content must be a string")]
    NotText,

    #[error("content is empty")]
    Empty,

    #[error("content is too long: {len} characters (max {max})")]
    TooLong { len: usize, max: usize },
}
