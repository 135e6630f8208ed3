//! The open output document and its close/reopen cycle.

use std::path::{Path, PathBuf};

use cimdoc_document::{DocumentApp, DocumentError};

use crate::error::WriterError;

/// Owns the output document for one run.
///
/// Large documents get slow to edit as caption fields pile up. With a
/// positive threshold, the session saves, closes and reopens the document
/// before a table write once that many tables were written since the last
/// cycle. Fields are never refreshed on reopen; heading and TOC ranges
/// would move under the cursors still to be processed.
pub(crate) struct Session<'a, A: DocumentApp> {
    app: &'a mut A,
    path: PathBuf,
    doc: Option<A::Doc>,
    threshold: i64,
    tables_since_reopen: i64,
    reopens: usize,
}

impl<'a, A: DocumentApp> Session<'a, A> {
    pub(crate) fn open(app: &'a mut A, path: &Path, threshold: i64) -> Result<Self, DocumentError> {
        let doc = app.open(path)?;
        tracing::debug!(path = %path.display(), "Opened output document");
        Ok(Self {
            app,
            path: path.to_path_buf(),
            doc: Some(doc),
            threshold,
            tables_since_reopen: 0,
            reopens: 0,
        })
    }

    pub(crate) fn is_open(&self) -> bool {
        self.doc.is_some()
    }

    pub(crate) fn doc(&self) -> Result<&A::Doc, WriterError> {
        self.doc.as_ref().ok_or(WriterError::NotOpen)
    }

    pub(crate) fn doc_mut(&mut self) -> Result<&mut A::Doc, WriterError> {
        self.doc.as_mut().ok_or(WriterError::NotOpen)
    }

    /// Call before writing a table. Cycles the document when the threshold
    /// has been reached.
    pub(crate) fn before_table(&mut self) -> Result<(), WriterError> {
        if self.threshold > 0 && self.tables_since_reopen >= self.threshold {
            self.reopen()?;
            self.tables_since_reopen = 0;
        }
        Ok(())
    }

    pub(crate) fn table_written(&mut self) {
        self.tables_since_reopen += 1;
    }

    pub(crate) fn reopens(&self) -> usize {
        self.reopens
    }

    fn reopen(&mut self) -> Result<(), WriterError> {
        let doc = self.doc.take().ok_or(WriterError::NotOpen)?;
        let saved = self.app.save(&doc, &self.path);
        self.app.close(doc);
        saved?;
        self.doc = Some(self.app.open(&self.path)?);
        self.reopens += 1;
        tracing::info!(
            path = %self.path.display(),
            reopens = self.reopens,
            "Reopened output document"
        );
        Ok(())
    }

    /// Save and close the document, if still open.
    pub(crate) fn finish(&mut self) -> Result<(), DocumentError> {
        let Some(doc) = self.doc.take() else {
            return Ok(());
        };
        let saved = self.app.save(&doc, &self.path);
        self.app.close(doc);
        if saved.is_ok() {
            tracing::debug!(path = %self.path.display(), "Saved output document");
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimdoc_document::{Document, FlowDocument, MemoryApp};

    fn app() -> MemoryApp {
        let mut doc = FlowDocument::new();
        doc.push_paragraph(None, "x");
        MemoryApp::new().with_document("out.docx", doc)
    }

    #[test]
    fn test_threshold_reopens_before_exceeding_table() {
        let mut app = app();
        let mut session = Session::open(&mut app, Path::new("out.docx"), 2).unwrap();
        for _ in 0..3 {
            session.before_table().unwrap();
            session.table_written();
        }
        assert_eq!(session.reopens(), 1);
        session.finish().unwrap();
        assert_eq!(app.opens(), 2);
        assert_eq!(app.closes(), 2);
    }

    #[test]
    fn test_disabled_threshold_never_reopens() {
        let mut app = app();
        let mut session = Session::open(&mut app, Path::new("out.docx"), 0).unwrap();
        for _ in 0..5 {
            session.before_table().unwrap();
            session.table_written();
        }
        assert_eq!(session.reopens(), 0);
    }

    #[test]
    fn test_reopen_keeps_edits() {
        let mut app = app();
        let mut session = Session::open(&mut app, Path::new("out.docx"), 1).unwrap();
        let doc = session.doc_mut().unwrap();
        let range = doc.find("x").unwrap();
        doc.replace_text(&range, "y").unwrap();
        session.table_written();
        session.before_table().unwrap();
        assert_eq!(session.doc().unwrap().text(), "y\n");
    }

    #[test]
    fn test_failed_reopen_leaves_session_closed() {
        let mut app = app().failing_open_after("out.docx", 1);
        let mut session = Session::open(&mut app, Path::new("out.docx"), 1).unwrap();
        session.table_written();
        assert!(session.before_table().is_err());
        assert!(!session.is_open());
        assert!(matches!(session.doc(), Err(WriterError::NotOpen)));
        session.finish().unwrap();
    }
}
