//! Supported document formats.

use std::fmt;
use std::path::Path;

use crate::error::DocumentError;

/// Document format, derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocFormat {
    /// Legacy binary word-processor document (`.doc`).
    Doc,
    /// OOXML package (`.docx`).
    Docx,
    /// Macro-enabled OOXML package (`.docm`).
    Docm,
    /// Flat XML document (`.xml`).
    FlatXml,
}

/// Groups of formats that can be converted into each other by copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    LegacyBinary,
    Ooxml,
    FlatXml,
}

impl DocFormat {
    /// Detect the format from a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnsupportedFormat`] for a missing or unknown
    /// extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| DocumentError::UnsupportedFormat(path.to_path_buf()))?;
        match ext.as_str() {
            "doc" => Ok(Self::Doc),
            "docx" => Ok(Self::Docx),
            "docm" => Ok(Self::Docm),
            "xml" => Ok(Self::FlatXml),
            _ => Err(DocumentError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    #[must_use]
    pub fn family(self) -> FormatFamily {
        match self {
            Self::Doc => FormatFamily::LegacyBinary,
            Self::Docx | Self::Docm => FormatFamily::Ooxml,
            Self::FlatXml => FormatFamily::FlatXml,
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Docm => "docm",
            Self::FlatXml => "xml",
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            DocFormat::from_path(Path::new("a/b.docx")).unwrap(),
            DocFormat::Docx
        );
        assert_eq!(
            DocFormat::from_path(Path::new("T.DOC")).unwrap(),
            DocFormat::Doc
        );
        assert_eq!(
            DocFormat::from_path(Path::new("flat.xml")).unwrap(),
            DocFormat::FlatXml
        );
    }

    #[test]
    fn test_from_path_rejects_unknown() {
        let err = DocFormat::from_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
        assert!(DocFormat::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_families() {
        assert_eq!(DocFormat::Docx.family(), DocFormat::Docm.family());
        assert_ne!(DocFormat::Doc.family(), DocFormat::Docx.family());
    }
}
