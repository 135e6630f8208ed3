//! Writer facade: one generation run from template to saved output.

use std::fmt;
use std::path::Path;

use cimdoc_document::{DocFormat, DocProperties, Document, DocumentApp, DocumentError};
use cimdoc_model::ModelFinder;

use crate::bookmark::BookmarkRegistry;
use crate::content::ContentWriter;
use crate::cursor::{CursorList, scan_captions};
use crate::error::WriterError;
use crate::hyperlink::write_hyperlinks;
use crate::options::{WriteMode, WriterOptions};
use crate::session::Session;
use crate::style::{StyleResolver, StyleRole};

/// Lifecycle of a run. States are entered strictly in declaration order;
/// `HyperlinksWritten` is skipped when hyperlinks are off, and a failed run
/// jumps to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriterState {
    Created,
    TemplateCopied,
    AppOpen,
    DocOpen,
    StylesDiscovered,
    CaptionsScanned,
    PlaceholdersScanned,
    ContentWritten,
    HyperlinksWritten,
    FieldsUpdated,
    Closed,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Placeholders found in the template.
    pub placeholders: usize,
    /// `placeholder: reason` for everything not replaced cleanly.
    pub failures: Vec<String>,
    pub figures_added: usize,
    pub tables_added: usize,
    /// Close/reopen cycles.
    pub reopens: usize,
    pub hyperlinks: usize,
    /// Hyperlink placeholders left as plain text.
    pub plain_links: usize,
}

impl WriteReport {
    /// Whether every placeholder was replaced.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generates documents from templates.
///
/// A writer owns its document app and can run any number of times; style
/// resolution and the bookmark registry are reset for every run.
///
/// # Example
///
/// ```
/// use cimdoc_document::{Document, FlowDocument, MemoryApp};
/// use cimdoc_model::DocModel;
/// use cimdoc_writer::{Writer, WriterOptions};
///
/// let mut template = FlowDocument::new();
/// template.push_paragraph(None, "Generated from {FILE}");
/// let app = MemoryApp::new().with_document("template.docx", template);
///
/// let model = DocModel::new("cim16.eap", Vec::new());
/// let mut writer = Writer::new(app, WriterOptions::default());
/// let report = writer
///     .write("template.docx".as_ref(), "out.docx".as_ref(), &model)
///     .unwrap();
///
/// assert!(report.is_clean());
/// let output = writer.app().get("out.docx".as_ref()).unwrap();
/// assert_eq!(output.text(), "Generated from cim16.eap\n");
/// ```
#[derive(Debug)]
pub struct Writer<A: DocumentApp> {
    app: A,
    options: WriterOptions,
    styles: StyleResolver,
    bookmarks: BookmarkRegistry,
    state: WriterState,
}

impl<A: DocumentApp> Writer<A> {
    #[must_use]
    pub fn new(app: A, options: WriterOptions) -> Self {
        let mut styles = StyleResolver::new();
        styles.init_preferred(options.styles.clone());
        Self {
            app,
            options,
            styles,
            bookmarks: BookmarkRegistry::new(),
            state: WriterState::Created,
        }
    }

    #[must_use]
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// State reached by the last run.
    #[must_use]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Bookmarks of the last run.
    #[must_use]
    pub fn bookmarks(&self) -> &BookmarkRegistry {
        &self.bookmarks
    }

    #[must_use]
    pub fn app(&self) -> &A {
        &self.app
    }

    #[must_use]
    pub fn into_app(self) -> A {
        self.app
    }

    /// Copy `template` to `output` and fill in its placeholders from `finder`.
    ///
    /// Once the output is open it is always saved, even when generation
    /// fails part way.
    ///
    /// # Errors
    ///
    /// Format and template errors abort before anything is opened. Errors
    /// after that are logged and added to the report, or returned in
    /// [`WriteMode::Strict`]. Failing to save the output is always returned.
    pub fn write<F>(
        &mut self,
        template: &Path,
        output: &Path,
        finder: &F,
    ) -> Result<WriteReport, WriterError>
    where
        F: ModelFinder + ?Sized,
    {
        self.state = WriterState::Created;
        self.bookmarks.clear();
        self.styles.reset();

        check_formats(&self.app, template, output)?;
        self.app
            .copy_template(template, output)
            .map_err(|e| match e {
                DocumentError::NotFound(path) => WriterError::TemplateNotFound(path),
                other => WriterError::Document(other),
            })?;
        advance(&mut self.state, WriterState::TemplateCopied);
        advance(&mut self.state, WriterState::AppOpen);

        let mut session = Session::open(&mut self.app, output, self.options.reopen_threshold)?;
        advance(&mut self.state, WriterState::DocOpen);

        let mut run = Run {
            options: &self.options,
            styles: &mut self.styles,
            bookmarks: &mut self.bookmarks,
            state: &mut self.state,
            report: WriteReport::default(),
        };
        let result = run.generate(&mut session, finder);
        run.report.reopens = session.reopens();

        let saved = session.finish();
        run.styles.reset();
        advance(run.state, WriterState::Closed);
        let mut report = run.report;

        if let Err(e) = result {
            tracing::error!(error = %e, output = %output.display(), "Generation aborted, partial output saved");
            if let Err(save_error) = &saved {
                tracing::error!(error = %save_error, "Failed to save output document");
            }
            if self.options.mode == WriteMode::Strict {
                return Err(e);
            }
            report.failures.push(format!("generation aborted: {e}"));
        }
        saved?;

        tracing::info!(
            output = %output.display(),
            placeholders = report.placeholders,
            failures = report.failures.len(),
            figures = report.figures_added,
            tables = report.tables_added,
            reopens = report.reopens,
            "Document generated"
        );
        Ok(report)
    }
}

/// Borrowed writer state for the steps that need the open document.
struct Run<'w> {
    options: &'w WriterOptions,
    styles: &'w mut StyleResolver,
    bookmarks: &'w mut BookmarkRegistry,
    state: &'w mut WriterState,
    report: WriteReport,
}

impl Run<'_> {
    fn generate<A, F>(&mut self, session: &mut Session<'_, A>, finder: &F) -> Result<(), WriterError>
    where
        A: DocumentApp,
        F: ModelFinder + ?Sized,
    {
        let doc = session.doc_mut()?;
        let properties = self.properties(doc.properties(), finder);
        doc.set_properties(properties);

        let mut styles = doc.styles().clone();
        for (name, def) in self.styles.init_usable(&mut styles) {
            doc.add_style(&name, def);
        }
        advance(self.state, WriterState::StylesDiscovered);

        let captions = scan_captions(doc, &self.options.captions);
        advance(self.state, WriterState::CaptionsScanned);

        let mut cursors = CursorList::scan(&*doc, &captions);
        self.report.placeholders = cursors.len();
        advance(self.state, WriterState::PlaceholdersScanned);

        let mut content = ContentWriter::new(
            session,
            &mut cursors,
            finder,
            self.options,
            self.styles,
            self.bookmarks,
        );
        let written = content.write_all();
        (self.report.figures_added, self.report.tables_added) = content.stats();
        self.report.failures = cursors.into_failures();
        written?;
        advance(self.state, WriterState::ContentWritten);

        if self.options.hyperlinks && self.options.deep_write {
            let links = write_hyperlinks(session.doc_mut()?, self.bookmarks);
            self.report.hyperlinks = links.hyperlinks;
            self.report.plain_links = links.plain;
            self.report.failures.extend(links.failures);
            advance(self.state, WriterState::HyperlinksWritten);
        }

        let toc_style = self.styles.style(StyleRole::Toc);
        session.doc_mut()?.update_fields(toc_style);
        advance(self.state, WriterState::FieldsUpdated);
        Ok(())
    }

    /// Configured metadata over the template's, plus the model file name.
    fn properties<F: ModelFinder + ?Sized>(&self, existing: &DocProperties, finder: &F) -> DocProperties {
        let configured = &self.options.properties;
        DocProperties {
            title: configured.title.clone().or_else(|| existing.title.clone()),
            subject: configured.subject.clone().or_else(|| existing.subject.clone()),
            author: configured.author.clone().or_else(|| existing.author.clone()),
            comments: Some(format!("Generated from {}", finder.file_name())),
        }
    }
}

fn advance(state: &mut WriterState, next: WriterState) {
    tracing::debug!(from = %state, to = %next, "Writer state");
    *state = next;
}

/// Both paths must have a supported extension in the same family, and the
/// app must handle both formats.
fn check_formats<A: DocumentApp>(app: &A, template: &Path, output: &Path) -> Result<(), WriterError> {
    let detect = |path: &Path| {
        DocFormat::from_path(path).map_err(|_| WriterError::UnsupportedFormat(path.to_path_buf()))
    };
    let template_format = detect(template)?;
    let output_format = detect(output)?;
    if template_format.family() != output_format.family() {
        return Err(WriterError::FormatMismatch {
            template: template_format,
            output: output_format,
        });
    }
    for (path, format) in [(template, template_format), (output, output_format)] {
        if !app.supports(format) {
            return Err(WriterError::UnsupportedFormat(path.to_path_buf()));
        }
    }
    Ok(())
}
