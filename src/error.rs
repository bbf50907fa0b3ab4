//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors for feed parsing, conversion and book assembly
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML in the feed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A required feed element was absent or empty
    #[error("Feed is missing required element: {0}")]
    MissingField(&'static str),

    /// A timestamp did not parse as RFC 3339
    #[error("Invalid timestamp '{value}': {source}")]
    Date {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
