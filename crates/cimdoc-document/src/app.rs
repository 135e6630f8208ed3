//! Document applications: open, save and copy documents.

use std::path::Path;

use crate::document::Document;
use crate::error::DocumentError;
use crate::flow::FlowDocument;
use crate::flow::xml::{parse_document, serialize_document};
use crate::format::DocFormat;

/// Opens and persists documents of some concrete format.
///
/// One app instance serves one generation run. The writer copies the
/// template to the output path, opens the copy, and may close and reopen it
/// several times before the final save.
pub trait DocumentApp {
    type Doc: Document;

    /// Whether this app can open and save `format`.
    fn supports(&self, format: DocFormat) -> bool;

    /// Copy the template to the output location.
    fn copy_template(&mut self, template: &Path, output: &Path) -> Result<(), DocumentError>;

    /// Open a document.
    fn open(&mut self, path: &Path) -> Result<Self::Doc, DocumentError>;

    /// Persist a document.
    fn save(&mut self, doc: &Self::Doc, path: &Path) -> Result<(), DocumentError>;

    /// Release a document. Unsaved changes are lost.
    fn close(&mut self, doc: Self::Doc) {
        drop(doc);
    }
}

/// File-backed app for the flat-XML format family.
#[derive(Debug, Default)]
pub struct FlatXmlApp;

impl FlatXmlApp {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn check_format(&self, path: &Path) -> Result<(), DocumentError> {
        let format = DocFormat::from_path(path)?;
        if self.supports(format) {
            Ok(())
        } else {
            Err(DocumentError::BackendFormat(format))
        }
    }
}

impl DocumentApp for FlatXmlApp {
    type Doc = FlowDocument;

    fn supports(&self, format: DocFormat) -> bool {
        format == DocFormat::FlatXml
    }

    fn copy_template(&mut self, template: &Path, output: &Path) -> Result<(), DocumentError> {
        self.check_format(template)?;
        self.check_format(output)?;
        if !template.exists() {
            return Err(DocumentError::NotFound(template.to_path_buf()));
        }
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(template, output)?;
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<FlowDocument, DocumentError> {
        self.check_format(path)?;
        let xml = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocumentError::NotFound(path.to_path_buf()),
            _ => DocumentError::Io(e),
        })?;
        let doc = parse_document(&xml)?;
        tracing::debug!(path = %path.display(), blocks = doc.blocks.len(), "Opened document");
        Ok(doc)
    }

    fn save(&mut self, doc: &FlowDocument, path: &Path) -> Result<(), DocumentError> {
        self.check_format(path)?;
        std::fs::write(path, serialize_document(doc))?;
        tracing::debug!(path = %path.display(), "Saved document");
        Ok(())
    }
}

impl FlowDocument {
    /// Parse a flat-XML string.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Malformed`] or an XML error for invalid input.
    pub fn from_xml(xml: &str) -> Result<Self, DocumentError> {
        parse_document(xml)
    }

    /// Serialize to flat XML.
    #[must_use]
    pub fn to_xml(&self) -> String {
        serialize_document(self)
    }
}
