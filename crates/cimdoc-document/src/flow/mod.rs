//! In-memory flow document.
//!
//! A [`FlowDocument`] is a list of blocks: paragraphs, tables and
//! table-of-contents fields. Paragraphs hold inline content (text runs, SEQ
//! caption fields, images, bookmarks, hyperlinks). The linear text and the
//! paragraph spans are built from the blocks on first use and cached until
//! the next edit.

mod paragraph;
pub(crate) mod xml;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::document::{
    CaptionInfo, CaptionLabels, CaptionSpec, DocProperties, Document, ImageSpec, ParagraphSpec,
    StyleDef, StyleSet, TableSpec,
};
use crate::error::DocumentError;
use crate::range::Range;

pub use paragraph::{IMAGE_CHAR, Image, Inline, Paragraph};

/// Default entry style prefix for heading TOC fields (`TOC 1`, `TOC 2`, ...).
pub(crate) const DEFAULT_TOC_STYLE: &str = "TOC";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Toc(Toc),
}

impl Block {
    fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        match self {
            Self::Paragraph(p) => Box::new(std::iter::once(p)),
            Self::Table(t) => Box::new(t.rows.iter().flatten()),
            Self::Toc(t) => Box::new(t.entries.iter()),
        }
    }

    fn paragraphs_mut(&mut self) -> Box<dyn Iterator<Item = &mut Paragraph> + '_> {
        match self {
            Self::Paragraph(p) => Box::new(std::iter::once(p)),
            Self::Table(t) => Box::new(t.rows.iter_mut().flatten()),
            Self::Toc(t) => Box::new(t.entries.iter_mut()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Table {
    pub(crate) style: Option<String>,
    pub(crate) rows: Vec<Vec<Paragraph>>,
}

/// A table-of-contents field.
///
/// With a `caption_label` it lists captions of that sequence (a table of
/// figures); otherwise it lists headings.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Toc {
    pub(crate) caption_label: Option<String>,
    pub(crate) entry_style: String,
    pub(crate) entries: Vec<Paragraph>,
}

/// Address of one paragraph inside the block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParaRef {
    Body(usize),
    Cell { block: usize, row: usize, col: usize },
    TocEntry { block: usize, entry: usize },
}

impl ParaRef {
    fn block(self) -> usize {
        match self {
            Self::Body(block) | Self::Cell { block, .. } | Self::TocEntry { block, .. } => block,
        }
    }
}

/// Where a paragraph's text sits in the linear text (terminator excluded).
#[derive(Debug, Clone, Copy)]
struct Span {
    para: ParaRef,
    start: usize,
    end: usize,
}

#[derive(Debug)]
struct Layout {
    text: String,
    spans: Vec<Span>,
}

/// Lazily built [`Layout`]. Never part of equality.
#[derive(Debug, Default)]
struct LayoutCache(OnceLock<Layout>);

impl Clone for LayoutCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl PartialEq for LayoutCache {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// In-memory document made of paragraphs, tables and TOC fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowDocument {
    pub(crate) blocks: Vec<Block>,
    pub(crate) styles: StyleSet,
    pub(crate) properties: DocProperties,
    layout: LayoutCache,
}

impl FlowDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a style (builder form).
    #[must_use]
    pub fn with_style(mut self, name: &str, def: StyleDef) -> Self {
        self.styles.insert(name.to_owned(), def);
        self
    }

    /// Append a text paragraph.
    pub fn push_paragraph(&mut self, style: Option<&str>, text: &str) -> &mut Self {
        self.blocks_mut()
            .push(Block::Paragraph(Paragraph::text(style, text)));
        self
    }

    /// Append a caption paragraph: `<label> <n> – <text>`.
    pub fn push_caption(&mut self, label: &str, number: usize, text: &str) -> &mut Self {
        self.blocks_mut()
            .push(Block::Paragraph(Paragraph::caption(label, number, text, None)));
        self
    }

    /// Append a table of plain cells.
    pub fn push_table(&mut self, rows: &[&[&str]]) -> &mut Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| Paragraph::text(None, cell)).collect())
            .collect();
        self.blocks_mut().push(Block::Table(Table { style: None, rows }));
        self
    }

    /// Append a table whose cells are given as paragraphs.
    pub fn push_table_paragraphs(&mut self, rows: Vec<Vec<Paragraph>>) -> &mut Self {
        self.blocks_mut().push(Block::Table(Table { style: None, rows }));
        self
    }

    /// Append a TOC field with pre-rendered entries.
    ///
    /// `caption_label` selects a table of captions instead of headings.
    pub fn push_toc(&mut self, caption_label: Option<&str>, entries: &[&str]) -> &mut Self {
        let entry_style = match caption_label {
            Some(_) => "Table of Figures".to_owned(),
            None => DEFAULT_TOC_STYLE.to_owned(),
        };
        let entries = entries.iter().map(|e| Paragraph::text(None, e)).collect();
        self.blocks_mut().push(Block::Toc(Toc {
            caption_label: caption_label.map(str::to_owned),
            entry_style,
            entries,
        }));
        self
    }

    /// First occurrence of `needle` in the linear text.
    #[must_use]
    pub fn find(&self, needle: &str) -> Option<Range> {
        let text = self.text();
        text.find(needle)
            .map(|start| Range::new(start, start + needle.len()))
    }

    /// Body paragraphs in document order (tables and TOC fields skipped).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Entries of every TOC field, in document order.
    pub fn toc_entries(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().flat_map(|b| match b {
            Block::Toc(t) => t.entries.as_slice(),
            _ => &[],
        })
    }

    /// `(bookmark, text)` of every hyperlink, in document order.
    #[must_use]
    pub fn hyperlinks(&self) -> Vec<(&str, &str)> {
        self.all_paragraphs()
            .flat_map(|p| p.inlines.iter())
            .filter_map(|i| match i {
                Inline::Hyperlink { bookmark, text } => Some((bookmark.as_str(), text.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Number of table blocks.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Table(_)))
            .count()
    }

    /// Number of embedded images.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.all_paragraphs()
            .flat_map(|p| p.inlines.iter())
            .filter(|i| matches!(i, Inline::Image(_)))
            .count()
    }

    /// Names of all bookmarks, in document order.
    #[must_use]
    pub fn bookmarks(&self) -> Vec<&str> {
        self.all_paragraphs()
            .flat_map(|p| p.inlines.iter())
            .filter_map(|i| match i {
                Inline::Bookmark(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn all_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().flat_map(Block::paragraphs)
    }

    fn all_paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks_mut().iter_mut().flat_map(Block::paragraphs_mut)
    }

    /// Paragraphs outside TOC fields: body text and table cells.
    fn content_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks
            .iter()
            .filter(|b| !matches!(b, Block::Toc(_)))
            .flat_map(Block::paragraphs)
    }

    /// Mutable access to the blocks. Drops the cached layout.
    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        self.layout.0.take();
        &mut self.blocks
    }

    fn layout(&self) -> &Layout {
        self.layout.0.get_or_init(|| self.build_layout())
    }

    /// Build the linear text together with every paragraph's span.
    fn build_layout(&self) -> Layout {
        let mut text = String::new();
        let mut spans = Vec::new();
        let mut push = |text: &mut String, para: ParaRef, p: &Paragraph, terminator: char| {
            let start = text.len();
            p.write_display(text);
            spans.push(Span {
                para,
                start,
                end: text.len(),
            });
            text.push(terminator);
        };

        for (block, b) in self.blocks.iter().enumerate() {
            match b {
                Block::Paragraph(p) => push(&mut text, ParaRef::Body(block), p, '\n'),
                Block::Table(t) => {
                    for (row, cells) in t.rows.iter().enumerate() {
                        for (col, p) in cells.iter().enumerate() {
                            push(&mut text, ParaRef::Cell { block, row, col }, p, '\t');
                        }
                        text.push('\n');
                    }
                }
                Block::Toc(t) => {
                    for (entry, p) in t.entries.iter().enumerate() {
                        push(&mut text, ParaRef::TocEntry { block, entry }, p, '\n');
                    }
                }
            }
        }
        Layout { text, spans }
    }

    /// The span of the paragraph that contains the whole range.
    fn locate(&self, range: &Range) -> Result<Span, DocumentError> {
        let spans = &self.layout().spans;
        let idx = spans.partition_point(|s| s.start <= range.start());
        idx.checked_sub(1)
            .map(|i| spans[i])
            .filter(|s| range.end() <= s.end)
            .ok_or(DocumentError::RangeOutOfParagraph(*range))
    }

    /// The span of the paragraph where the range starts.
    fn locate_start(&self, range: &Range) -> Result<Span, DocumentError> {
        self.locate(&Range::at(range.start()))
    }

    fn paragraph(&self, para: ParaRef) -> Option<&Paragraph> {
        match (para, self.blocks.get(para.block())?) {
            (ParaRef::Body(_), Block::Paragraph(p)) => Some(p),
            (ParaRef::Cell { row, col, .. }, Block::Table(t)) => t.rows.get(row)?.get(col),
            (ParaRef::TocEntry { entry, .. }, Block::Toc(t)) => t.entries.get(entry),
            _ => None,
        }
    }

    fn paragraph_mut(&mut self, para: ParaRef) -> Option<&mut Paragraph> {
        match (para, self.blocks_mut().get_mut(para.block())?) {
            (ParaRef::Body(_), Block::Paragraph(p)) => Some(p),
            (ParaRef::Cell { row, col, .. }, Block::Table(t)) => {
                t.rows.get_mut(row)?.get_mut(col)
            }
            (ParaRef::TocEntry { entry, .. }, Block::Toc(t)) => t.entries.get_mut(entry),
            _ => None,
        }
    }

    /// Splice `replacement` over the range inside its paragraph.
    fn splice(&mut self, range: &Range, replacement: Inline) -> Result<(), DocumentError> {
        let span = self.locate(range)?;
        let paragraph = self
            .paragraph_mut(span.para)
            .ok_or(DocumentError::RangeOutOfParagraph(*range))?;
        paragraph.splice(
            range.start() - span.start,
            range.end() - span.start,
            replacement,
            *range,
        )
    }

    /// Range covering a block's text (first to last paragraph span).
    fn block_range(&self, block: usize) -> Option<Range> {
        let mut in_block = self
            .layout()
            .spans
            .iter().filter(|s| s.para.block() == block);
        let first = in_block.next()?;
        let last = in_block.last().unwrap_or(first);
        Some(Range::new(first.start, last.end))
    }

    fn insert_block_after(&mut self, at: &Range, block: Block) -> Result<Range, DocumentError> {
        let span = self.locate_start(at)?;
        let idx = span.para.block() + 1;
        self.blocks_mut().insert(idx, block);
        self.block_range(idx)
            .ok_or_else(|| DocumentError::Malformed("inserted block has no text".to_owned()))
    }

    fn number_seq_fields(&mut self) {
        let mut counters: HashMap<String, usize> = HashMap::new();
        for block in self.blocks_mut() {
            if matches!(block, Block::Toc(_)) {
                continue;
            }
            for p in block.paragraphs_mut() {
                for inline in &mut p.inlines {
                    if let Inline::Seq { label, number } = inline {
                        let counter = counters.entry(label.to_ascii_lowercase()).or_default();
                        *counter += 1;
                        *number = *counter;
                    }
                }
            }
        }
    }

    /// Reset hyperlinks that point at a caption bookmark to the caption's
    /// current `<label> <n>`.
    fn refresh_caption_references(&mut self) {
        let mut targets: HashMap<String, String> = HashMap::new();
        for p in self.content_paragraphs() {
            let seq = p.inlines.iter().find_map(|i| match i {
                Inline::Seq { label, number } => Some(format!("{label} {number}")),
                _ => None,
            });
            let Some(reference) = seq else { continue };
            for inline in &p.inlines {
                if let Inline::Bookmark(name) = inline {
                    targets.insert(name.clone(), reference.clone());
                }
            }
        }
        if targets.is_empty() {
            return;
        }
        for p in self.all_paragraphs_mut() {
            for inline in &mut p.inlines {
                if let Inline::Hyperlink { bookmark, text } = inline
                    && let Some(reference) = targets.get(bookmark.as_str())
                {
                    reference.clone_into(text);
                }
            }
        }
    }

    fn regenerate_tocs(&mut self, toc_style: &str) {
        let mut headings = Vec::new();
        let mut captions: HashMap<String, Vec<Paragraph>> = HashMap::new();
        for p in self.content_paragraphs() {
            let level = p
                .style
                .as_ref()
                .and_then(|s| self.styles.get(s))
                .and_then(|d| d.outline_level);
            if let Some(level) = level {
                headings.push((level, p.display_text()));
            }
            if let Some(label) = p.seq_label() {
                captions
                    .entry(label.to_ascii_lowercase())
                    .or_default()
                    .push(Paragraph::text(None, &p.display_text()));
            }
        }

        for block in self.blocks_mut() {
            let Block::Toc(toc) = block else { continue };
            if toc.caption_label.is_none() {
                toc_style.clone_into(&mut toc.entry_style);
            }
            toc.entries = match &toc.caption_label {
                Some(label) => captions
                    .get(&label.to_ascii_lowercase())
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .map(|mut p| {
                        p.style = Some(toc.entry_style.clone());
                        p
                    })
                    .collect(),
                None => headings
                    .iter()
                    .map(|(level, text)| {
                        let style = format!("{} {level}", toc.entry_style);
                        Paragraph::text(Some(&style), text)
                    })
                    .collect(),
            };
        }
    }
}

impl Document for FlowDocument {
    fn text(&self) -> String {
        self.layout().text.clone()
    }

    fn len(&self) -> usize {
        self.layout().text.len()
    }

    fn styles(&self) -> &StyleSet {
        &self.styles
    }

    fn add_style(&mut self, name: &str, def: StyleDef) {
        self.styles.insert(name.to_owned(), def);
    }

    fn normalize_caption_labels(&mut self, labels: &CaptionLabels) -> usize {
        let mut changed = 0;
        for block in self.blocks_mut() {
            if let Block::Toc(toc) = block
                && let Some(label) = &toc.caption_label
                && let Some(kind) = labels.kind_of(label)
            {
                let canonical = labels.label(kind);
                for entry in &mut toc.entries {
                    if entry.relabel_prefix(label, canonical) {
                        changed += 1;
                    }
                }
                if label != canonical {
                    toc.caption_label = Some(canonical.to_owned());
                    changed += 1;
                }
            }
        }
        for p in self.all_paragraphs_mut() {
            changed += p.normalize_seq_labels(labels);
        }
        changed
    }

    fn captions(&self, labels: &CaptionLabels) -> Vec<CaptionInfo> {
        self.layout()
            .spans
            .iter()
            .filter(|s| !matches!(s.para, ParaRef::TocEntry { .. }))
            .filter_map(|s| {
                let kind = labels.kind_of(self.paragraph(s.para)?.seq_label()?)?;
                Some(CaptionInfo {
                    kind,
                    range: Range::new(s.start, s.end),
                })
            })
            .collect()
    }

    fn is_in_toc(&self, range: &Range) -> bool {
        self.locate(range)
            .is_ok_and(|s| matches!(s.para, ParaRef::TocEntry { .. }))
    }

    fn outline_level_at(&self, range: &Range) -> Option<u8> {
        let span = self.locate_start(range).ok()?;
        let style = self.paragraph(span.para)?.style.as_ref()?;
        self.styles.get(style)?.outline_level
    }

    fn replace_text(&mut self, range: &Range, text: &str) -> Result<Range, DocumentError> {
        self.splice(range, Inline::Text(text.to_owned()))?;
        Ok(Range::new(range.start(), range.start() + text.len()))
    }

    fn replace_with_image(
        &mut self,
        range: &Range,
        image: &ImageSpec,
    ) -> Result<Range, DocumentError> {
        self.splice(range, Inline::Image(Image::from(image)))?;
        Ok(Range::new(
            range.start(),
            range.start() + IMAGE_CHAR.len_utf8(),
        ))
    }

    fn set_paragraph_style(&mut self, range: &Range, style: &str) -> Result<(), DocumentError> {
        let span = self.locate_start(range)?;
        let paragraph = self
            .paragraph_mut(span.para)
            .ok_or(DocumentError::RangeOutOfParagraph(*range))?;
        paragraph.style = Some(style.to_owned());
        Ok(())
    }

    fn insert_paragraph_after(
        &mut self,
        at: &Range,
        paragraph: &ParagraphSpec,
    ) -> Result<Range, DocumentError> {
        let p = Paragraph::text(paragraph.style.as_deref(), &paragraph.text);
        self.insert_block_after(at, Block::Paragraph(p))
    }

    fn insert_image_after(
        &mut self,
        at: &Range,
        image: &ImageSpec,
        style: Option<&str>,
    ) -> Result<Range, DocumentError> {
        let p = Paragraph {
            style: style.map(str::to_owned),
            inlines: vec![Inline::Image(Image::from(image))],
        };
        self.insert_block_after(at, Block::Paragraph(p))
    }

    fn insert_caption_after(
        &mut self,
        at: &Range,
        caption: &CaptionSpec,
    ) -> Result<Range, DocumentError> {
        let p = Paragraph::caption(
            &caption.label,
            caption.number,
            &caption.text,
            caption.style.as_deref(),
        );
        self.insert_block_after(at, Block::Paragraph(p))
    }

    fn insert_table_after(
        &mut self,
        at: &Range,
        table: &TableSpec,
    ) -> Result<Range, DocumentError> {
        let row = |cells: &[String], style: Option<&str>| {
            cells
                .iter()
                .map(|c| Paragraph::text(style, c))
                .collect::<Vec<_>>()
        };
        let mut rows = Vec::with_capacity(table.rows.len() + 1);
        if !table.header.is_empty() {
            rows.push(row(&table.header, table.head_style.as_deref()));
        }
        rows.extend(
            table
                .rows
                .iter()
                .map(|r| row(r, table.cell_style.as_deref())),
        );
        if rows.is_empty() {
            return Err(DocumentError::Malformed("table has no rows".to_owned()));
        }
        self.insert_block_after(
            at,
            Block::Table(Table {
                style: table.style.clone(),
                rows,
            }),
        )
    }

    fn make_hyperlink(&mut self, range: &Range, bookmark: &str) -> Result<(), DocumentError> {
        let covered = range
            .slice(&self.layout().text)
            .ok_or(DocumentError::InvalidBoundary(*range))?
            .to_owned();
        self.splice(
            range,
            Inline::Hyperlink {
                bookmark: bookmark.to_owned(),
                text: covered,
            },
        )
    }

    fn add_bookmark(&mut self, range: &Range, name: &str) -> Result<(), DocumentError> {
        let span = self.locate_start(range)?;
        for p in self.all_paragraphs_mut() {
            p.inlines
                .retain(|i| !matches!(i, Inline::Bookmark(existing) if existing == name));
        }
        let paragraph = self
            .paragraph_mut(span.para)
            .ok_or(DocumentError::RangeOutOfParagraph(*range))?;
        paragraph.inlines.insert(0, Inline::Bookmark(name.to_owned()));
        Ok(())
    }

    fn hyperlink_count(&self) -> usize {
        self.all_paragraphs()
            .flat_map(|p| p.inlines.iter())
            .filter(|i| matches!(i, Inline::Hyperlink { .. }))
            .count()
    }

    fn update_fields(&mut self, toc_style: &str) {
        self.number_seq_fields();
        self.refresh_caption_references();
        self.regenerate_tocs(toc_style);
    }

    fn properties(&self) -> &DocProperties {
        &self.properties
    }

    fn set_properties(&mut self, properties: DocProperties) {
        self.properties = properties;
    }
}
