//! Document error types.

use std::path::PathBuf;
use std::str::Utf8Error;

use crate::range::Range;

/// Error from a document capability or a document app.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// The path has no supported extension.
    #[error("unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The app cannot open or save this format.
    #[error("format {0} is not supported by this backend")]
    BackendFormat(crate::DocFormat),

    /// File not found.
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The range does not lie inside a single paragraph.
    #[error("range {0} does not lie within one paragraph")]
    RangeOutOfParagraph(Range),

    /// The range covers something other than plain text (a field or image).
    #[error("range {0} covers non-text content")]
    NotText(Range),

    /// A range boundary falls inside a multi-byte character.
    #[error("range {0} does not fall on character boundaries")]
    InvalidBoundary(Range),

    /// Malformed flat-XML content.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// XML parsing error.
    #[error("XML parse error")]
    Xml(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error")]
    Utf8(#[from] Utf8Error),

    /// Encoding error during XML parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Embedded image payload is not valid base64.
    #[error("invalid embedded image")]
    Image(#[from] base64::DecodeError),
}
