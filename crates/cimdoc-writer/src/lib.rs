//! Template placeholder substitution engine.
//!
//! A template is an ordinary document with placeholders in its text. The
//! [`Writer`] copies the template to the output path, finds every
//! placeholder and replaces it with content from a documentation model:
//! values, headings, descriptions, figures and captioned tables.
//!
//! # Placeholders
//!
//! Content placeholders are `{KEYWORD}` or `{KEYWORD:arguments}`:
//!
//! | Placeholder | Replaced with |
//! |-------------|---------------|
//! | `{FILE}` | Model file name |
//! | `{ATTR:Class.attribute}` | Initial value of an attribute |
//! | `{IEC61850_NSNAME:name}` | Full namespace name |
//! | `{DIAG:Owner.Diagram}` | Figure with caption and intro sentence |
//! | `{DIAG_NOTE:Owner.Diagram}` | Diagram note |
//! | `{PACKAGE:name}` | Package section with classes and subpackages |
//! | `{CLASS:qualified.Name}` | Class section with property tables |
//! | `{PRES_CONDITIONS:pkg}`, `{FCS:pkg}`, `{TRGOPS:pkg}`, `{ABBREVIATIONS:pkg}`, `{SCL_ENUMS:pkg}`, `{LNMAP_PACKAGE:pkg}`, `{DATA_INDEX:pkg}` | Generated tables |
//!
//! Lookup misses are written into the document as `[... not found]` and
//! collected in the [`WriteReport`].
//!
//! # Numbering
//!
//! Captions already in the template are counted before anything is written,
//! so every generated figure and table gets the number it will have once
//! fields are refreshed. Cross references to classes are written as
//! `[[HLINK:display|bookmark]]` and resolved in a second pass, once all
//! bookmarks are known.

mod bookmark;
mod content;
mod cursor;
mod error;
mod hyperlink;
mod options;
mod placeholder;
mod session;
mod style;
mod tables;
mod writer;

pub use bookmark::BookmarkRegistry;
pub use cursor::{Caption, CaptionCounts, Cursor, CursorList, scan_captions};
pub use error::WriterError;
pub use options::{FigureIntro, WriteMode, WriterOptions};
pub use placeholder::{
    Diagnostic, HyperlinkPlaceholder, Keyword, PackageTable, Placeholder, PlaceholderKind,
};
pub use style::{MAX_LEVEL, StyleResolver, StyleRole};
pub use writer::{WriteReport, Writer, WriterState};

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(WriteReport: Send, Sync, Clone);
    assert_impl_all!(BookmarkRegistry: Send, Sync);
    assert_impl_all!(StyleResolver: Send, Sync);
    assert_impl_all!(WriterOptions: Send, Sync, Clone);
    assert_impl_all!(WriterError: Send, Sync, std::error::Error);
}
