//! The [`Document`] capability trait and the value types it exchanges.

use std::collections::BTreeMap;

use crate::error::DocumentError;
use crate::range::Range;

/// Styles defined in a document, keyed by name.
pub type StyleSet = BTreeMap<String, StyleDef>;

/// What a style applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleKind {
    #[default]
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Character => "character",
            Self::Table => "table",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paragraph" => Some(Self::Paragraph),
            "character" => Some(Self::Character),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

/// A style definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleDef {
    pub kind: StyleKind,
    /// Outline level for heading styles (1-based).
    pub outline_level: Option<u8>,
}

impl StyleDef {
    #[must_use]
    pub fn paragraph() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn heading(level: u8) -> Self {
        Self {
            kind: StyleKind::Paragraph,
            outline_level: Some(level),
        }
    }

    #[must_use]
    pub fn table() -> Self {
        Self {
            kind: StyleKind::Table,
            outline_level: None,
        }
    }
}

/// Auto-numbered caption kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptionKind {
    Figure,
    Table,
}

/// Canonical caption labels and the aliases recognized as the same sequence.
///
/// Templates authored in other locales or by other tools may label their
/// captions differently (`Fig`, `Abbildung`). Aliases are matched
/// case-insensitively and rewritten to the canonical label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLabels {
    pub figure: String,
    pub table: String,
    pub figure_aliases: Vec<String>,
    pub table_aliases: Vec<String>,
}

impl Default for CaptionLabels {
    fn default() -> Self {
        Self {
            figure: "Figure".to_owned(),
            table: "Table".to_owned(),
            figure_aliases: Vec::new(),
            table_aliases: Vec::new(),
        }
    }
}

impl CaptionLabels {
    /// Canonical label for `kind`.
    #[must_use]
    pub fn label(&self, kind: CaptionKind) -> &str {
        match kind {
            CaptionKind::Figure => &self.figure,
            CaptionKind::Table => &self.table,
        }
    }

    /// Which caption sequence a SEQ identifier belongs to, if any.
    #[must_use]
    pub fn kind_of(&self, label: &str) -> Option<CaptionKind> {
        let matches = |canonical: &str, aliases: &[String]| {
            canonical.eq_ignore_ascii_case(label)
                || aliases.iter().any(|a| a.eq_ignore_ascii_case(label))
        };
        if matches(&self.figure, &self.figure_aliases) {
            Some(CaptionKind::Figure)
        } else if matches(&self.table, &self.table_aliases) {
            Some(CaptionKind::Table)
        } else {
            None
        }
    }
}

/// A caption found in the document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionInfo {
    pub kind: CaptionKind,
    /// Range of the caption paragraph's text.
    pub range: Range,
}

/// A plain paragraph to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSpec {
    pub text: String,
    pub style: Option<String>,
}

impl ParagraphSpec {
    #[must_use]
    pub fn new(text: impl Into<String>, style: Option<&str>) -> Self {
        Self {
            text: text.into(),
            style: style.map(str::to_owned),
        }
    }
}

/// An image to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    /// File name the image was loaded from.
    pub name: String,
    pub data: Vec<u8>,
}

/// A caption paragraph to insert: `<label> <SEQ number> – <text>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSpec {
    pub label: String,
    pub number: usize,
    pub text: String,
    pub style: Option<String>,
}

/// A table to insert. The header row uses `head_style`, body rows `cell_style`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSpec {
    pub style: Option<String>,
    pub head_style: Option<String>,
    pub cell_style: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Document metadata fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub comments: Option<String>,
}

/// Capabilities the generation engine needs from an open document.
///
/// Insertion methods take an anchor range and add a new block after the
/// block that contains the anchor's start. They return the range of the new
/// block's text so callers can chain further insertions.
///
/// Every mutating call may move the text after the edit point; ranges that
/// lie after the edit must be shifted by the caller.
pub trait Document {
    /// The linear text of the whole document.
    fn text(&self) -> String;

    /// Length of the linear text in bytes.
    fn len(&self) -> usize {
        self.text().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn styles(&self) -> &StyleSet;

    fn add_style(&mut self, name: &str, def: StyleDef);

    /// Rewrite caption labels (in the body and in caption TOC fields) to the
    /// canonical labels. Returns the number of labels changed.
    fn normalize_caption_labels(&mut self, labels: &CaptionLabels) -> usize;

    /// Figure and table captions in the body, in document order.
    fn captions(&self, labels: &CaptionLabels) -> Vec<CaptionInfo>;

    /// Whether the range lies inside a table-of-contents field.
    fn is_in_toc(&self, range: &Range) -> bool;

    /// Outline level of the paragraph containing the range start.
    fn outline_level_at(&self, range: &Range) -> Option<u8>;

    /// Replace the covered text. Returns the range of the new text.
    fn replace_text(&mut self, range: &Range, text: &str) -> Result<Range, DocumentError>;

    /// Replace the covered text with an inline image.
    fn replace_with_image(&mut self, range: &Range, image: &ImageSpec)
    -> Result<Range, DocumentError>;

    /// Set the style of the paragraph containing the range start.
    fn set_paragraph_style(&mut self, range: &Range, style: &str) -> Result<(), DocumentError>;

    fn insert_paragraph_after(
        &mut self,
        at: &Range,
        paragraph: &ParagraphSpec,
    ) -> Result<Range, DocumentError>;

    fn insert_image_after(
        &mut self,
        at: &Range,
        image: &ImageSpec,
        style: Option<&str>,
    ) -> Result<Range, DocumentError>;

    fn insert_caption_after(
        &mut self,
        at: &Range,
        caption: &CaptionSpec,
    ) -> Result<Range, DocumentError>;

    fn insert_table_after(&mut self, at: &Range, table: &TableSpec)
    -> Result<Range, DocumentError>;

    /// Turn the covered text into a hyperlink to `#bookmark`.
    fn make_hyperlink(&mut self, range: &Range, bookmark: &str) -> Result<(), DocumentError>;

    /// Place a bookmark at the start of the paragraph containing the range.
    fn add_bookmark(&mut self, range: &Range, name: &str) -> Result<(), DocumentError>;

    fn hyperlink_count(&self) -> usize;

    /// Renumber caption fields, refresh cross-references to captions and
    /// regenerate TOC fields. Heading TOC entries get `<toc_style> <level>`.
    fn update_fields(&mut self, toc_style: &str);

    fn properties(&self) -> &DocProperties;

    fn set_properties(&mut self, properties: DocProperties);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_labels_kind_of() {
        let labels = CaptionLabels {
            figure_aliases: vec!["Abbildung".to_owned()],
            ..CaptionLabels::default()
        };
        assert_eq!(labels.kind_of("Figure"), Some(CaptionKind::Figure));
        assert_eq!(labels.kind_of("figure"), Some(CaptionKind::Figure));
        assert_eq!(labels.kind_of("ABBILDUNG"), Some(CaptionKind::Figure));
        assert_eq!(labels.kind_of("Table"), Some(CaptionKind::Table));
        assert_eq!(labels.kind_of("Equation"), None);
    }

    #[test]
    fn test_style_kind_round_trip_names() {
        for kind in [StyleKind::Paragraph, StyleKind::Character, StyleKind::Table] {
            assert_eq!(StyleKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(StyleKind::parse("list"), None);
    }
}
