//! Document capability set for cimdoc.
//!
//! The generation engine never touches a concrete file format directly. It
//! talks to a [`Document`] through a small set of capabilities (read the
//! linear text, replace a [`Range`], insert paragraphs, tables, figures and
//! captions after an anchor, make hyperlinks, refresh fields) and opens or
//! saves documents through a [`DocumentApp`].
//!
//! # Implementations
//!
//! - [`FlowDocument`]: in-memory block model (paragraphs, tables, TOC fields)
//! - [`FlatXmlApp`]: file-backed app for the flat-XML format family
//! - [`MemoryApp`]: in-memory app for tests (behind the `mock` feature)
//!
//! # Linear text
//!
//! Every document exposes its content as one string. Ranges are byte offsets
//! into that string:
//!
//! - body and TOC paragraphs end with `\n`
//! - table cells end with `\t`, table rows end with `\n`
//! - images display as U+FFFC, SEQ fields display their number
//!
//! # Example
//!
//! ```
//! use cimdoc_document::{Document, FlowDocument, ParagraphSpec};
//!
//! let mut doc = FlowDocument::new();
//! doc.push_paragraph(None, "Value: {FILE}");
//! let range = doc.find("{FILE}").unwrap();
//! doc.replace_text(&range, "cim.eap").unwrap();
//! assert_eq!(doc.text(), "Value: cim.eap\n");
//!
//! let anchor = doc.find("Value").unwrap();
//! doc.insert_paragraph_after(&anchor, &ParagraphSpec::new("Next", None))
//!     .unwrap();
//! assert_eq!(doc.text(), "Value: cim.eap\nNext\n");
//! ```

mod app;
mod document;
mod error;
mod flow;
mod format;
#[cfg(feature = "mock")]
mod mock;
mod range;

pub use app::{DocumentApp, FlatXmlApp};
pub use document::{
    CaptionInfo, CaptionKind, CaptionLabels, CaptionSpec, DocProperties, Document, ImageSpec,
    ParagraphSpec, StyleDef, StyleKind, StyleSet, TableSpec,
};
pub use error::DocumentError;
pub use flow::{FlowDocument, Image, Inline, Paragraph};
pub use format::{DocFormat, FormatFamily};
#[cfg(feature = "mock")]
pub use mock::MemoryApp;
pub use range::Range;
