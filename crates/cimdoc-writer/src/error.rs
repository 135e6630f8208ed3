use std::path::PathBuf;

use cimdoc_document::{DocFormat, DocumentError};

/// Errors from a generation run.
///
/// Format and template errors are raised before any document is opened.
/// The rest come from writing content and are, per placeholder, logged and
/// skipped rather than returned.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WriterError {
    /// Unknown extension, or a format the document app cannot handle.
    #[error("Unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Template format {template} and output format {output} belong to different families")]
    FormatMismatch {
        template: DocFormat,
        output: DocFormat,
    },

    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Cannot read diagram image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was lost during a close/reopen cycle.
    #[error("Document is not open")]
    NotOpen,
}
