//! Paragraphs and inline content.

use crate::document::{CaptionLabels, ImageSpec};
use crate::error::DocumentError;
use crate::range::Range;

/// How an image shows up in the linear text.
pub const IMAGE_CHAR: char = '\u{FFFC}';

/// Separator between a caption's number and its text.
const CAPTION_SEPARATOR: &str = " – ";

/// An embedded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    pub data: Vec<u8>,
}

impl From<&ImageSpec> for Image {
    fn from(spec: &ImageSpec) -> Self {
        Self {
            name: spec.name.clone(),
            data: spec.data.clone(),
        }
    }
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    /// SEQ field: auto-numbered per label, displays its number.
    Seq { label: String, number: usize },
    Image(Image),
    /// Zero-width bookmark anchor.
    Bookmark(String),
    /// Hyperlink to `#bookmark`, displays `text`.
    Hyperlink { bookmark: String, text: String },
}

impl Inline {
    fn write_display(&self, out: &mut String) {
        match self {
            Self::Text(t) | Self::Hyperlink { text: t, .. } => out.push_str(t),
            Self::Seq { number, .. } => out.push_str(&number.to_string()),
            Self::Image(_) => out.push(IMAGE_CHAR),
            Self::Bookmark(_) => {}
        }
    }

    fn display_len(&self) -> usize {
        match self {
            Self::Text(t) | Self::Hyperlink { text: t, .. } => t.len(),
            Self::Seq { number, .. } => number.to_string().len(),
            Self::Image(_) => IMAGE_CHAR.len_utf8(),
            Self::Bookmark(_) => 0,
        }
    }
}

/// A paragraph: optional style plus inline content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub style: Option<String>,
    pub inlines: Vec<Inline>,
}

impl Paragraph {
    /// A plain text paragraph.
    #[must_use]
    pub fn text(style: Option<&str>, text: &str) -> Self {
        let inlines = if text.is_empty() {
            Vec::new()
        } else {
            vec![Inline::Text(text.to_owned())]
        };
        Self {
            style: style.map(str::to_owned),
            inlines,
        }
    }

    /// A caption paragraph: `<label> <SEQ> – <text>`.
    #[must_use]
    pub fn caption(label: &str, number: usize, text: &str, style: Option<&str>) -> Self {
        let mut inlines = vec![
            Inline::Text(format!("{label} ")),
            Inline::Seq {
                label: label.to_owned(),
                number,
            },
        ];
        if !text.is_empty() {
            inlines.push(Inline::Text(format!("{CAPTION_SEPARATOR}{text}")));
        }
        Self {
            style: style.map(str::to_owned),
            inlines,
        }
    }

    pub(crate) fn write_display(&self, out: &mut String) {
        for inline in &self.inlines {
            inline.write_display(out);
        }
    }

    /// The paragraph as it displays in the linear text.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        self.write_display(&mut out);
        out
    }

    /// Label of the first SEQ field, if this is a caption paragraph.
    #[must_use]
    pub fn seq_label(&self) -> Option<&str> {
        self.inlines.iter().find_map(|i| match i {
            Inline::Seq { label, .. } => Some(label.as_str()),
            _ => None,
        })
    }

    /// Replace the display bytes `[start, end)` with `replacement`.
    ///
    /// Only text runs may be cut; a range touching a field, image or
    /// hyperlink fails with [`DocumentError::NotText`]. Bookmarks at or
    /// before `start` stay in front of the replacement.
    pub(crate) fn splice(
        &mut self,
        start: usize,
        end: usize,
        replacement: Inline,
        range: Range,
    ) -> Result<(), DocumentError> {
        let mut out = Vec::with_capacity(self.inlines.len() + 2);
        let mut replacement = Some(replacement);
        let mut pos = 0;

        for inline in &self.inlines {
            let len = inline.display_len();
            let (s, e) = (pos, pos + len);
            pos = e;

            if len == 0 {
                if s > start {
                    out.extend(replacement.take());
                }
                out.push(inline.clone());
            } else if e <= start {
                out.push(inline.clone());
            } else if s >= end {
                out.extend(replacement.take());
                out.push(inline.clone());
            } else {
                let Inline::Text(t) = inline else {
                    return Err(DocumentError::NotText(range));
                };
                let prefix = t
                    .get(..start.saturating_sub(s))
                    .ok_or(DocumentError::InvalidBoundary(range))?;
                let suffix = if end < e {
                    t.get(end - s..)
                        .ok_or(DocumentError::InvalidBoundary(range))?
                } else {
                    ""
                };
                out.push(Inline::Text(prefix.to_owned()));
                out.extend(replacement.take());
                out.push(Inline::Text(suffix.to_owned()));
            }
        }
        out.extend(replacement.take());
        self.inlines = merge_text(out);
        Ok(())
    }

    /// Rewrite aliased SEQ labels (and the label text before them) to the
    /// canonical label. Returns the number of fields changed.
    pub(crate) fn normalize_seq_labels(&mut self, labels: &CaptionLabels) -> usize {
        let mut changed = 0;
        for i in 0..self.inlines.len() {
            let Inline::Seq { label, .. } = &self.inlines[i] else {
                continue;
            };
            let Some(kind) = labels.kind_of(label) else {
                continue;
            };
            let canonical = labels.label(kind);
            if label == canonical {
                continue;
            }
            let old = label.clone();
            if i > 0
                && let Inline::Text(prefix) = &mut self.inlines[i - 1]
            {
                replace_label_suffix(prefix, &old, canonical);
            }
            if let Inline::Seq { label, .. } = &mut self.inlines[i] {
                canonical.clone_into(label);
            }
            changed += 1;
        }
        changed
    }

    /// Rewrite a leading `old` label in plain text to `new`.
    pub(crate) fn relabel_prefix(&mut self, old: &str, new: &str) -> bool {
        let Some(Inline::Text(first)) = self.inlines.first_mut() else {
            return false;
        };
        let Some(head) = first.get(..old.len()) else {
            return false;
        };
        if old == new || !head.eq_ignore_ascii_case(old) {
            return false;
        }
        first.replace_range(..old.len(), new);
        true
    }
}

/// Replace a trailing `old` label (ignoring trailing spaces) with `new`.
fn replace_label_suffix(text: &mut String, old: &str, new: &str) {
    let trimmed = text.trim_end();
    let Some(cut) = trimmed.len().checked_sub(old.len()) else {
        return;
    };
    if trimmed
        .get(cut..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case(old))
    {
        let end = trimmed.len();
        text.replace_range(cut..end, new);
    }
}

/// Join adjacent text runs and drop empty ones.
fn merge_text(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match (out.last_mut(), inline) {
            (_, Inline::Text(t)) if t.is_empty() => {}
            (Some(Inline::Text(prev)), Inline::Text(t)) => prev.push_str(&t),
            (_, inline) => out.push(inline),
        }
    }
    out
}
