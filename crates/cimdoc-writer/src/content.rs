//! Content dispatcher: resolves each cursor against the model and writes it.

use std::path::Path;

use cimdoc_document::{
    CaptionKind, CaptionSpec, Document, DocumentApp, DocumentError, ImageSpec, ParagraphSpec,
    Range, TableSpec,
};
use cimdoc_model::{ClassDoc, DiagramDoc, ModelFinder, PackageDoc, PropertiesDoc};

use crate::bookmark::BookmarkRegistry;
use crate::cursor::{CursorList, Edit};
use crate::error::WriterError;
use crate::options::{FigureIntro, WriterOptions};
use crate::placeholder::{Diagnostic, HyperlinkPlaceholder, Placeholder, PlaceholderKind};
use crate::session::Session;
use crate::style::{StyleResolver, StyleRole};
use crate::tables::package_tables;

/// Result of writing one placeholder: the text it resolved to, or a
/// diagnostic for a lookup miss. `Err` means writing itself failed.
type Outcome = Result<Result<String, Diagnostic>, WriterError>;

/// Where the first block of generated content goes.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    /// Over the placeholder text.
    Replace(Range),
    /// In a new paragraph after the one containing the range.
    After(Range),
}

/// Writes content for every cursor, in document order.
///
/// Every mutation is recorded as an [`Edit`]; once a cursor is done, later
/// cursors are shifted past its edits. Lookup misses and write failures of
/// one placeholder never stop the pass. Only losing the document does.
/// A placeholder whose content failed to write is marked in the document
/// like a lookup miss, unless part of its content already replaced it.
pub(crate) struct ContentWriter<'w, 'a, A: DocumentApp, F: ModelFinder + ?Sized> {
    session: &'w mut Session<'a, A>,
    cursors: &'w mut CursorList,
    finder: &'w F,
    options: &'w WriterOptions,
    styles: &'w StyleResolver,
    bookmarks: &'w mut BookmarkRegistry,
    current: usize,
    edits: Vec<Edit>,
    figures: usize,
    tables: usize,
}

impl<'w, 'a, A: DocumentApp, F: ModelFinder + ?Sized> ContentWriter<'w, 'a, A, F> {
    pub(crate) fn new(
        session: &'w mut Session<'a, A>,
        cursors: &'w mut CursorList,
        finder: &'w F,
        options: &'w WriterOptions,
        styles: &'w StyleResolver,
        bookmarks: &'w mut BookmarkRegistry,
    ) -> Self {
        Self {
            session,
            cursors,
            finder,
            options,
            styles,
            bookmarks,
            current: 0,
            edits: Vec::new(),
            figures: 0,
            tables: 0,
        }
    }

    /// Figures and tables written so far.
    pub(crate) fn stats(&self) -> (usize, usize) {
        (self.figures, self.tables)
    }

    /// Process every cursor.
    ///
    /// # Errors
    ///
    /// Returns an error only when the document was lost (a failed reopen).
    pub(crate) fn write_all(&mut self) -> Result<(), WriterError> {
        let written = self.write_cursors();

        let failures = self.cursors.failures();
        if !failures.is_empty() {
            tracing::warn!(
                count = failures.len(),
                failures = ?failures,
                supported = ?Placeholder::supported_formats(),
                "Some placeholders were not replaced"
            );
        }
        written
    }

    fn write_cursors(&mut self) -> Result<(), WriterError> {
        for index in 0..self.cursors.len() {
            let Some(cursor) = self.cursors.get(index) else {
                break;
            };
            let placeholder = cursor.placeholder().clone();
            let range = cursor.range();
            self.current = index;
            self.edits.clear();

            let outcome = match self.write_cursor(&placeholder, range) {
                Err(e) if self.session.is_open() => self.mark_failed(&placeholder, range, &e),
                outcome => outcome,
            };
            let edits = std::mem::take(&mut self.edits);
            self.cursors.apply_edits(index, &edits);
            self.record(index, &placeholder, outcome)?;
        }
        Ok(())
    }

    /// Turn a write failure into a diagnostic, writing its text over the
    /// placeholder when nothing has been written there yet.
    fn mark_failed(&mut self, placeholder: &Placeholder, range: Range, error: &WriterError) -> Outcome {
        tracing::error!(
            placeholder = placeholder.text(),
            error = %error,
            "Failed to write placeholder content"
        );
        let diagnostic = Diagnostic::failed(placeholder, error);
        let untouched = self.edits.is_empty()
            && range.slice(&self.session.doc()?.text()) == Some(placeholder.text());
        if untouched {
            self.miss(range, diagnostic)
        } else {
            Ok(Err(diagnostic))
        }
    }

    fn record(
        &mut self,
        index: usize,
        placeholder: &Placeholder,
        outcome: Outcome,
    ) -> Result<(), WriterError> {
        match outcome {
            Ok(Ok(content)) => {
                tracing::debug!(placeholder = placeholder.text(), "Replaced placeholder");
                if let Some(cursor) = self.cursors.get_mut(index) {
                    cursor.placeholder_mut().set_replaced_text(content);
                }
            }
            Ok(Err(diagnostic)) => {
                tracing::warn!(
                    placeholder = placeholder.text(),
                    reason = %diagnostic,
                    "Placeholder not resolved"
                );
                self.cursors
                    .add_failure(format!("{}: {}", placeholder.text(), diagnostic.message));
                if let Some(cursor) = self.cursors.get_mut(index) {
                    cursor.placeholder_mut().set_error_text(diagnostic.text);
                }
            }
            Err(e) => {
                if !self.session.is_open() {
                    return Err(e);
                }
                tracing::error!(
                    placeholder = placeholder.text(),
                    error = %e,
                    "Failed to write placeholder content"
                );
                self.cursors
                    .add_failure(format!("{}: {e}", placeholder.text()));
            }
        }
        Ok(())
    }

    fn write_cursor(&mut self, placeholder: &Placeholder, range: Range) -> Outcome {
        let finder = self.finder;
        let deep = self.options.deep_write;

        match placeholder.kind() {
            PlaceholderKind::File => {
                let name = finder.file_name().to_owned();
                self.replace(&range, &name)?;
                Ok(Ok(name))
            }
            PlaceholderKind::Attribute { class, attribute } => {
                self.value(range, finder.find_attribute_value(class, attribute), || {
                    Diagnostic::not_found("Attribute", &format!("{class}.{attribute}"))
                })
            }
            PlaceholderKind::IecNsName { name } => {
                self.value(range, finder.find_iec61850_ns_name(name), || {
                    Diagnostic::not_found("IEC 61850 namespace", name)
                })
            }
            PlaceholderKind::DiagNote { owner, diagram } => {
                self.value(range, finder.find_diagram_note(owner, diagram), || {
                    Diagnostic::not_found("Diagram note", &format!("{owner}.{diagram}"))
                })
            }
            PlaceholderKind::Diagram { owner, diagram } => {
                let Some(path) = finder.find_diagram_file(owner, diagram) else {
                    return self.miss(
                        range,
                        Diagnostic::not_found("Diagram", &format!("{owner}.{diagram}")),
                    );
                };
                if !deep {
                    self.replace(&range, diagram)?;
                    return Ok(Ok(diagram.clone()));
                }
                let image = load_image(&path)?;
                let (_, intro) = self.figure(Anchor::Replace(range), &image, diagram)?;
                Ok(Ok(intro))
            }
            PlaceholderKind::Package { name } => {
                let Some(package) = finder.package_doc(name) else {
                    return self.miss(range, Diagnostic::not_found("Package", name));
                };
                let level = self.level_at(range)?;
                if deep {
                    self.package(Anchor::Replace(range), package, level)?;
                } else {
                    self.heading(Anchor::Replace(range), &package.name, level)?;
                }
                Ok(Ok(package.name.clone()))
            }
            PlaceholderKind::Class { qualified_name } => {
                let Some(class) = finder.class_doc(qualified_name) else {
                    return self.miss(range, Diagnostic::not_found("Class", qualified_name));
                };
                let level = self.level_at(range)?;
                if deep {
                    self.class(Anchor::Replace(range), class, level)?;
                } else {
                    self.heading(Anchor::Replace(range), &class.name, level)?;
                }
                Ok(Ok(class.name.clone()))
            }
            PlaceholderKind::PackageTable { table, package } => {
                let Some(package) = finder.package_doc(package) else {
                    return self.miss(range, Diagnostic::not_found("Package", package));
                };
                if !deep {
                    self.replace(&range, &package.name)?;
                    return Ok(Ok(package.name.clone()));
                }
                let mut last = self.replace(&range, &package.description)?;
                for generated in package_tables(*table, package) {
                    last = self.table(&last, &generated.caption, generated.header, generated.rows)?;
                }
                Ok(Ok(package.description.clone()))
            }
            PlaceholderKind::Unsupported => self.miss(range, Diagnostic::unsupported(placeholder)),
        }
    }

    fn value(
        &mut self,
        range: Range,
        value: Option<String>,
        miss: impl FnOnce() -> Diagnostic,
    ) -> Outcome {
        match value {
            Some(value) => {
                self.replace(&range, &value)?;
                Ok(Ok(value))
            }
            None => self.miss(range, miss()),
        }
    }

    fn miss(&mut self, range: Range, diagnostic: Diagnostic) -> Outcome {
        self.replace(&range, &diagnostic.text)?;
        Ok(Err(diagnostic))
    }

    /// Outline level of the placeholder's paragraph; unstyled text is level 1.
    fn level_at(&self, range: Range) -> Result<u8, WriterError> {
        Ok(self.session.doc()?.outline_level_at(&range).unwrap_or(1))
    }

    fn package(
        &mut self,
        anchor: Anchor,
        package: &PackageDoc,
        level: u8,
    ) -> Result<Range, WriterError> {
        let mut last = self.heading(anchor, &package.name, level)?;
        if !package.description.is_empty() {
            last = self.paragraph_after(&last, &package.description, StyleRole::Paragraph)?;
        }
        last = self.diagrams(last, &package.qualified_name, &package.diagrams)?;
        for class in &package.classes {
            last = self.class(Anchor::After(last), class, level.saturating_add(1))?;
        }
        for child in &package.packages {
            last = self.package(Anchor::After(last), child, level.saturating_add(1))?;
        }
        Ok(last)
    }

    fn class(&mut self, anchor: Anchor, class: &ClassDoc, level: u8) -> Result<Range, WriterError> {
        let heading = self.heading(anchor, &class.name, level)?;
        if self.options.hyperlinks {
            let bookmark = class.bookmark();
            if !self.bookmarks.is_available(&bookmark) {
                self.session.doc_mut()?.add_bookmark(&heading, &bookmark)?;
                self.bookmarks.mark_available(&bookmark);
            }
        }

        let mut last = heading;
        if self.options.print_inheritance && !class.inheritance_path.is_empty() {
            let line = self.inheritance_line(class);
            last = self.paragraph_after(&last, &line, StyleRole::Paragraph)?;
        }
        if !class.description.is_empty() {
            last = self.paragraph_after(&last, &class.description, StyleRole::Paragraph)?;
        }
        last = self.diagrams(last, &class.qualified_name, &class.diagrams)?;
        self.property_tables(last, class)
    }

    /// `Inheritance path = Class : Super : Root`, linking documented classes.
    fn inheritance_line(&mut self, class: &ClassDoc) -> String {
        let finder = self.finder;
        let mut parts = vec![class.name.clone()];
        for superclass in &class.inheritance_path {
            let target = finder
                .class_doc(superclass)
                .filter(|_| self.options.hyperlinks);
            match target {
                Some(target) => {
                    let bookmark = target.bookmark();
                    self.bookmarks.register(&bookmark);
                    parts.push(HyperlinkPlaceholder::format(superclass, &bookmark));
                }
                None => parts.push(superclass.clone()),
            }
        }
        format!("Inheritance path = {}", parts.join(" : "))
    }

    fn property_tables(&mut self, mut last: Range, class: &ClassDoc) -> Result<Range, WriterError> {
        let sections: [(&str, &[PropertiesDoc], bool); 3] = [
            ("Attributes", &class.attributes, true),
            ("Association ends", &class.association_ends, true),
            ("Operations", &class.operations, false),
        ];
        for (title, properties, multiplicity) in sections {
            if properties.is_empty() {
                continue;
            }
            let header: &[&str] = if multiplicity {
                &["Name", "Type", "Mult", "Description"]
            } else {
                &["Name", "Type", "Description"]
            };
            let rows = properties
                .iter()
                .map(|property| {
                    let mut row = vec![property.name.clone(), self.type_cell(property)];
                    if multiplicity {
                        row.push(property.multiplicity.clone());
                    }
                    row.push(property.description.clone());
                    row
                })
                .collect();
            let header = header.iter().map(|&h| h.to_owned()).collect();
            last = self.table(&last, &format!("{title} of {}", class.name), header, rows)?;
        }
        Ok(last)
    }

    fn type_cell(&mut self, property: &PropertiesDoc) -> String {
        match &property.type_bookmark {
            Some(bookmark) if self.options.hyperlinks => {
                self.bookmarks.register(bookmark);
                HyperlinkPlaceholder::format(&property.type_name, bookmark)
            }
            _ => property.type_name.clone(),
        }
    }

    /// Figures for every diagram with an image on disk, after `last`.
    fn diagrams(
        &mut self,
        mut last: Range,
        owner: &str,
        diagrams: &[DiagramDoc],
    ) -> Result<Range, WriterError> {
        let finder = self.finder;
        for diagram in diagrams {
            let Some(path) = finder.find_diagram_file(owner, &diagram.name) else {
                tracing::debug!(owner, diagram = %diagram.name, "No image for diagram");
                continue;
            };
            let image = load_image(&path)?;
            (last, _) = self.figure(Anchor::After(last), &image, &diagram.name)?;
        }
        Ok(last)
    }

    /// Write a numbered figure with its caption and intro sentence. The
    /// intro's `<label> <n>` links to a bookmark on the caption, so updating
    /// fields keeps it in step with the caption number.
    ///
    /// Returns the range of the last block written and the intro text.
    fn figure(
        &mut self,
        anchor: Anchor,
        image: &ImageSpec,
        name: &str,
    ) -> Result<(Range, String), WriterError> {
        let styles = self.styles;
        let number = self.cursors.caption_added(self.current, CaptionKind::Figure);
        self.figures += 1;
        let label = self.options.captions.label(CaptionKind::Figure).to_owned();
        let reference = format!("{label} {number}");
        let intro = format!("{reference} shows {name}.");
        let caption = CaptionSpec {
            label,
            number,
            text: name.to_owned(),
            style: Some(styles.style(StyleRole::FigureCaption).to_owned()),
        };
        let figure_style = styles.style(StyleRole::Figure);

        let (intro_range, caption_range) = match self.options.figure_intro {
            FigureIntro::Before => {
                let intro_range = match anchor {
                    Anchor::Replace(range) => self.replace(&range, &intro)?,
                    Anchor::After(range) => {
                        self.paragraph_after(&range, &intro, StyleRole::Paragraph)?
                    }
                };
                let image_range = self.insert(|doc| {
                    doc.insert_image_after(&intro_range, image, Some(figure_style))
                })?;
                let caption_range =
                    self.insert(|doc| doc.insert_caption_after(&image_range, &caption))?;
                (intro_range, caption_range)
            }
            FigureIntro::After => {
                let image_range = match anchor {
                    Anchor::Replace(range) => {
                        let image_range = self.replace_with_image(&range, image)?;
                        self.session
                            .doc_mut()?
                            .set_paragraph_style(&image_range, figure_style)?;
                        image_range
                    }
                    Anchor::After(range) => self.insert(|doc| {
                        doc.insert_image_after(&range, image, Some(figure_style))
                    })?,
                };
                let caption_range =
                    self.insert(|doc| doc.insert_caption_after(&image_range, &caption))?;
                let intro_range =
                    self.paragraph_after(&caption_range, &intro, StyleRole::Paragraph)?;
                (intro_range, caption_range)
            }
        };

        // Bookmarks are zero-width and links keep their text: no edits.
        let bookmark = format!("_Ref_Figure_{}", self.figures);
        let doc = self.session.doc_mut()?;
        doc.add_bookmark(&caption_range, &bookmark)?;
        let start = intro_range.start();
        doc.make_hyperlink(&Range::new(start, start + reference.len()), &bookmark)?;

        tracing::debug!(figure = number, diagram = name, bookmark = %bookmark, "Wrote figure");
        let last = match self.options.figure_intro {
            FigureIntro::Before => caption_range,
            FigureIntro::After => intro_range,
        };
        Ok((last, intro))
    }

    /// Write a captioned table after `after`, cycling the document first when
    /// the reopen threshold is reached.
    fn table(
        &mut self,
        after: &Range,
        caption: &str,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Range, WriterError> {
        self.session.before_table()?;
        let styles = self.styles;
        let number = self.cursors.caption_added(self.current, CaptionKind::Table);
        let caption_spec = CaptionSpec {
            label: self.options.captions.label(CaptionKind::Table).to_owned(),
            number,
            text: caption.to_owned(),
            style: Some(styles.style(StyleRole::TableCaption).to_owned()),
        };
        let spec = TableSpec {
            style: None,
            head_style: Some(styles.style(StyleRole::TableHead).to_owned()),
            cell_style: Some(styles.style(StyleRole::TableCell).to_owned()),
            header,
            rows,
        };

        let caption_range = self.insert(|doc| doc.insert_caption_after(after, &caption_spec))?;
        let table_range = self.insert(|doc| doc.insert_table_after(&caption_range, &spec))?;
        self.session.table_written();
        self.tables += 1;
        tracing::debug!(table = number, caption, rows = spec.rows.len(), "Wrote table");
        Ok(table_range)
    }

    fn heading(&mut self, anchor: Anchor, text: &str, level: u8) -> Result<Range, WriterError> {
        let style = self.styles.heading(level);
        match anchor {
            Anchor::Replace(range) => {
                let heading = self.replace(&range, text)?;
                self.session
                    .doc_mut()?
                    .set_paragraph_style(&heading, &style)?;
                Ok(heading)
            }
            Anchor::After(range) => {
                let spec = ParagraphSpec::new(text, Some(&style));
                self.insert(|doc| doc.insert_paragraph_after(&range, &spec))
            }
        }
    }

    fn paragraph_after(
        &mut self,
        after: &Range,
        text: &str,
        role: StyleRole,
    ) -> Result<Range, WriterError> {
        let spec = ParagraphSpec::new(text, Some(self.styles.style(role)));
        self.insert(|doc| doc.insert_paragraph_after(after, &spec))
    }

    fn replace(&mut self, range: &Range, text: &str) -> Result<Range, WriterError> {
        let replaced = self.session.doc_mut()?.replace_text(range, text)?;
        self.edits
            .push(Edit::resize(range.end(), range.len(), replaced.len()));
        Ok(replaced)
    }

    fn replace_with_image(&mut self, range: &Range, image: &ImageSpec) -> Result<Range, WriterError> {
        let replaced = self.session.doc_mut()?.replace_with_image(range, image)?;
        self.edits
            .push(Edit::resize(range.end(), range.len(), replaced.len()));
        Ok(replaced)
    }

    /// Run an insertion and record how far it moved the following text.
    fn insert(
        &mut self,
        write: impl FnOnce(&mut A::Doc) -> Result<Range, DocumentError>,
    ) -> Result<Range, WriterError> {
        let doc = self.session.doc_mut()?;
        let before = doc.len();
        let inserted = write(doc)?;
        let after = doc.len();
        self.edits
            .push(Edit::resize(inserted.start(), before, after));
        Ok(inserted)
    }
}

fn load_image(path: &Path) -> Result<ImageSpec, WriterError> {
    let data = std::fs::read(path).map_err(|source| WriterError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageSpec { name, data })
}
