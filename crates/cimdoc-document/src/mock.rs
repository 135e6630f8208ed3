//! Mock document app for testing.
//!
//! Provides [`MemoryApp`] for exercising the generation engine without
//! touching the filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::app::DocumentApp;
use crate::error::DocumentError;
use crate::flow::FlowDocument;
use crate::format::DocFormat;

/// In-memory document app.
///
/// Documents live in a path-keyed map. Every open hands out a clone; saving
/// writes the clone back. Open, save and close calls are counted so tests
/// can assert on close/reopen cycles.
///
/// # Example
///
/// ```ignore
/// use cimdoc_document::{DocumentApp, FlowDocument, MemoryApp};
///
/// let mut template = FlowDocument::new();
/// template.push_paragraph(None, "{FILE}");
/// let mut app = MemoryApp::new().with_document("template.docx", template);
///
/// app.copy_template("template.docx".as_ref(), "out.docx".as_ref()).unwrap();
/// let doc = app.open("out.docx".as_ref()).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MemoryApp {
    documents: HashMap<PathBuf, FlowDocument>,
    unsupported: Vec<DocFormat>,
    fail_open: Option<(PathBuf, usize)>,
    opens: usize,
    saves: usize,
    closes: usize,
}

impl MemoryApp {
    /// Create an app that supports every format.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under `path` (builder form).
    #[must_use]
    pub fn with_document(mut self, path: impl Into<PathBuf>, doc: FlowDocument) -> Self {
        self.insert(path, doc);
        self
    }

    /// Report `format` as unsupported.
    #[must_use]
    pub fn without_format(mut self, format: DocFormat) -> Self {
        self.unsupported.push(format);
        self
    }

    /// Let `successful` opens of `path` through, then fail every later one.
    #[must_use]
    pub fn failing_open_after(mut self, path: impl Into<PathBuf>, successful: usize) -> Self {
        self.fail_open = Some((path.into(), successful));
        self
    }

    /// Store a document under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, doc: FlowDocument) {
        self.documents.insert(path.into(), doc);
    }

    /// The stored document at `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&FlowDocument> {
        self.documents.get(path)
    }

    #[must_use]
    pub fn opens(&self) -> usize {
        self.opens
    }

    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }

    #[must_use]
    pub fn closes(&self) -> usize {
        self.closes
    }
}

impl DocumentApp for MemoryApp {
    type Doc = FlowDocument;

    fn supports(&self, format: DocFormat) -> bool {
        !self.unsupported.contains(&format)
    }

    fn copy_template(&mut self, template: &Path, output: &Path) -> Result<(), DocumentError> {
        let doc = self
            .documents
            .get(template)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(template.to_path_buf()))?;
        self.documents.insert(output.to_path_buf(), doc);
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<FlowDocument, DocumentError> {
        if let Some((failing, successful)) = &self.fail_open
            && failing == path
            && self.opens >= *successful
        {
            return Err(DocumentError::Io(std::io::Error::other("simulated open failure")));
        }
        let doc = self
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(path.to_path_buf()))?;
        self.opens += 1;
        Ok(doc)
    }

    fn save(&mut self, doc: &FlowDocument, path: &Path) -> Result<(), DocumentError> {
        self.documents.insert(path.to_path_buf(), doc.clone());
        self.saves += 1;
        Ok(())
    }

    fn close(&mut self, doc: FlowDocument) {
        drop(doc);
        self.closes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_copy_and_counters() {
        let mut template = FlowDocument::new();
        template.push_paragraph(None, "x");
        let mut app = MemoryApp::new().with_document("t.docx", template);

        app.copy_template(Path::new("t.docx"), Path::new("o.docx"))
            .unwrap();
        let mut doc = app.open(Path::new("o.docx")).unwrap();
        let range = doc.find("x").unwrap();
        doc.replace_text(&range, "y").unwrap();
        app.save(&doc, Path::new("o.docx")).unwrap();
        app.close(doc);

        assert_eq!(app.opens(), 1);
        assert_eq!(app.saves(), 1);
        assert_eq!(app.closes(), 1);
        assert_eq!(app.get(Path::new("o.docx")).unwrap().text(), "y\n");
        assert_eq!(app.get(Path::new("t.docx")).unwrap().text(), "x\n");
    }

    #[test]
    fn test_missing_template() {
        let mut app = MemoryApp::new();
        let err = app
            .copy_template(Path::new("none.docx"), Path::new("o.docx"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[test]
    fn test_failing_open_after() {
        let mut app = MemoryApp::new()
            .with_document("o.docx", FlowDocument::new())
            .failing_open_after("o.docx", 1);
        assert!(app.open(Path::new("o.docx")).is_ok());
        assert!(app.open(Path::new("o.docx")).is_err());
        assert_eq!(app.opens(), 1);
    }

    #[test]
    fn test_unsupported_format() {
        let app = MemoryApp::new().without_format(DocFormat::Doc);
        assert!(!app.supports(DocFormat::Doc));
        assert!(app.supports(DocFormat::Docx));
    }
}
