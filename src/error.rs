//! Unified error type for genedeck operations.
//!
//! Every layer (package handling, data lookups, chart rendering, report
//! assembly) reports through this one enum so callers see a consistent API.
use thiserror::Error;

/// Main error type for genedeck operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// PNG encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid pack URI
    #[error("Invalid pack URI: {0}")]
    InvalidPackUri(String),

    /// Stream or part not found in the package
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Relationship not found
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    /// Invalid content type
    #[error("Invalid content type: expected {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },

    /// Slide number past the end of the deck
    #[error("Slide {slide} out of range: presentation has {count} slides")]
    SlideOutOfRange { slide: usize, count: usize },

    /// Text-box ordinal past the last text-bearing shape on the slide
    #[error("Text box {ordinal} not found on slide {slide}")]
    TextBoxNotFound { slide: usize, ordinal: usize },

    /// Expected field absent from an API response
    #[error("Missing field in {source_name} response: {field}")]
    MissingField {
        source_name: &'static str,
        field: &'static str,
    },

    /// Expected cross reference absent from the UniProt entry
    #[error("UniProt entry has no {0} cross reference")]
    MissingCrossReference(&'static str),

    /// Non-success HTTP status from a data source
    #[error("{source_name} request failed ({status}): {message}")]
    Api {
        source_name: &'static str,
        status: u16,
        message: String,
    },

    /// GraphQL-level errors in an otherwise successful response
    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

/// Result type for genedeck operations.
pub type Result<T> = std::result::Result<T, Error>;
