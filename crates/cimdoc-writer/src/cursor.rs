//! Caption and cursor tracking.
//!
//! Before any content is written, the template is scanned twice: once for
//! the figure and table captions it already contains, once for placeholder
//! matches. Each match becomes a [`Cursor`] carrying the number of figures
//! and tables that precede it, so the next caption written at that point
//! gets the right sequence number no matter what was generated earlier.

use cimdoc_document::{CaptionKind, CaptionLabels, Document, Range};

use crate::placeholder::{Placeholder, content_matches};

/// A caption present in the template before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caption {
    pub kind: CaptionKind,
    pub range: Range,
}

/// Figures and tables preceding a point in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptionCounts {
    pub figures: usize,
    pub tables: usize,
}

impl CaptionCounts {
    #[must_use]
    pub fn get(&self, kind: CaptionKind) -> usize {
        match kind {
            CaptionKind::Figure => self.figures,
            CaptionKind::Table => self.tables,
        }
    }

    fn add(&mut self, kind: CaptionKind) {
        match kind {
            CaptionKind::Figure => self.figures += 1,
            CaptionKind::Table => self.tables += 1,
        }
    }
}

/// A placeholder bound to its range and the captions before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    placeholder: Placeholder,
    range: Range,
    counts: CaptionCounts,
}

impl Cursor {
    #[must_use]
    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    pub(crate) fn placeholder_mut(&mut self) -> &mut Placeholder {
        &mut self.placeholder
    }

    /// Current range of the placeholder text.
    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    #[must_use]
    pub fn counts(&self) -> CaptionCounts {
        self.counts
    }
}

/// One text mutation: everything at or after `at` moved by `delta` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edit {
    pub at: usize,
    pub delta: isize,
}

impl Edit {
    /// Edit for text that grew from `before` to `after` bytes.
    pub(crate) fn resize(at: usize, before: usize, after: usize) -> Self {
        Self {
            at,
            delta: len_delta(before, after),
        }
    }
}

pub(crate) fn len_delta(before: usize, after: usize) -> isize {
    let diff = |a: usize, b: usize| isize::try_from(a - b).unwrap_or(isize::MAX);
    if after >= before {
        diff(after, before)
    } else {
        -diff(before, after)
    }
}

/// Placeholder cursors in document order, plus replacement failures.
#[derive(Debug, Default)]
pub struct CursorList {
    cursors: Vec<Cursor>,
    failures: Vec<String>,
}

impl CursorList {
    /// Scan `doc` for placeholders.
    ///
    /// Matches inside table-of-contents fields are skipped. `captions` must
    /// be in document order (see [`scan_captions`]).
    pub fn scan<D: Document + ?Sized>(doc: &D, captions: &[Caption]) -> Self {
        let text = doc.text();
        let matches: Vec<(Range, &str)> = content_matches(&text)
            .filter(|(range, matched)| {
                let in_toc = doc.is_in_toc(range);
                if in_toc {
                    tracing::debug!(placeholder = matched, "Skipping placeholder in TOC");
                }
                !in_toc
            })
            .collect();
        let ranges: Vec<Range> = matches.iter().map(|(range, _)| *range).collect();
        let counts = seed_counts(captions, &ranges);

        let cursors = matches
            .into_iter()
            .zip(counts)
            .map(|((range, matched), counts)| Cursor {
                placeholder: Placeholder::parse(matched),
                range: range.duplicate(),
                counts,
            })
            .collect::<Vec<_>>();
        tracing::debug!(
            placeholders = cursors.len(),
            captions = captions.len(),
            "Scanned placeholders"
        );
        Self {
            cursors,
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Cursor> {
        self.cursors.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Cursor> {
        self.cursors.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.iter()
    }

    /// Record that a caption of `kind` was written while processing the
    /// cursor at `index`, and return its sequence number.
    ///
    /// Counts of that cursor and every later one advance by one.
    pub fn caption_added(&mut self, index: usize, kind: CaptionKind) -> usize {
        for cursor in self.cursors.iter_mut().skip(index) {
            cursor.counts.add(kind);
        }
        self.cursors
            .get(index)
            .map_or(0, |cursor| cursor.counts.get(kind))
    }

    /// Shift the ranges of cursors after `index` past the edits made while
    /// processing it. Edits apply in the order they were made.
    pub(crate) fn apply_edits(&mut self, index: usize, edits: &[Edit]) {
        for cursor in self.cursors.iter_mut().skip(index + 1) {
            for edit in edits {
                if cursor.range.start() >= edit.at {
                    cursor.range = cursor.range.shifted(edit.delta);
                }
            }
        }
    }

    /// Replacement failures recorded so far, as `placeholder: message`.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub(crate) fn add_failure(&mut self, failure: String) {
        self.failures.push(failure);
    }

    pub(crate) fn into_failures(self) -> Vec<String> {
        self.failures
    }
}

/// Normalize caption labels, then collect the template's captions.
pub fn scan_captions<D: Document + ?Sized>(doc: &mut D, labels: &CaptionLabels) -> Vec<Caption> {
    let renamed = doc.normalize_caption_labels(labels);
    if renamed > 0 {
        tracing::info!(renamed, "Normalized caption labels");
    }
    let captions: Vec<Caption> = doc
        .captions(labels)
        .into_iter()
        .map(|info| Caption {
            kind: info.kind,
            range: info.range.duplicate(),
        })
        .collect();
    tracing::debug!(captions = captions.len(), "Scanned captions");
    captions
}

/// Captions preceding each match.
///
/// The first match counts the captions ending at or before its start. Every
/// later match adds the captions that start at or after the previous
/// match's end and end at or before its own start. Both boundaries are
/// inclusive.
pub(crate) fn seed_counts(captions: &[Caption], matches: &[Range]) -> Vec<CaptionCounts> {
    let mut counts = CaptionCounts::default();
    let mut next = 0;
    let mut previous: Option<Range> = None;
    let mut seeded = Vec::with_capacity(matches.len());

    for range in matches {
        while let Some(caption) = captions.get(next) {
            if caption.range.end() > range.start() {
                break;
            }
            let after_previous = previous.is_none_or(|p| caption.range.start() >= p.end());
            if after_previous {
                counts.add(caption.kind);
            }
            next += 1;
        }
        seeded.push(counts);
        previous = Some(*range);
    }
    seeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimdoc_document::FlowDocument;
    use pretty_assertions::assert_eq;

    fn caption(kind: CaptionKind, start: usize, end: usize) -> Caption {
        Caption {
            kind,
            range: Range::new(start, end),
        }
    }

    fn counts(figures: usize, tables: usize) -> CaptionCounts {
        CaptionCounts { figures, tables }
    }

    #[test]
    fn test_seed_counts_accumulates() {
        let captions = [
            caption(CaptionKind::Figure, 0, 10),
            caption(CaptionKind::Table, 20, 30),
            caption(CaptionKind::Figure, 50, 60),
        ];
        let matches = [Range::new(12, 18), Range::new(40, 45), Range::new(70, 75)];
        assert_eq!(
            seed_counts(&captions, &matches),
            vec![counts(1, 0), counts(1, 1), counts(2, 1)]
        );
    }

    #[test]
    fn test_seed_counts_boundaries_are_inclusive() {
        let captions = [
            caption(CaptionKind::Figure, 0, 10),
            caption(CaptionKind::Figure, 15, 20),
        ];
        // First caption ends exactly at the first match; the second starts
        // exactly at the first match's end and ends at the second match.
        let matches = [Range::new(10, 15), Range::new(20, 25)];
        assert_eq!(
            seed_counts(&captions, &matches),
            vec![counts(1, 0), counts(2, 0)]
        );
    }

    #[test]
    fn test_seed_counts_skips_caption_around_previous_match() {
        let captions = [caption(CaptionKind::Table, 0, 20)];
        let matches = [Range::new(5, 10), Range::new(30, 35)];
        assert_eq!(
            seed_counts(&captions, &matches),
            vec![counts(0, 0), counts(0, 0)]
        );
    }

    #[test]
    fn test_seed_counts_empty() {
        assert!(seed_counts(&[], &[]).is_empty());
        assert_eq!(
            seed_counts(&[caption(CaptionKind::Figure, 0, 3)], &[Range::new(1, 2)]),
            vec![counts(0, 0)]
        );
    }

    #[test]
    fn test_scan_counts_captions_and_skips_tocs() {
        let mut doc = FlowDocument::new();
        doc.push_toc(None, &["{PACKAGE:Core}"])
            .push_paragraph(None, "{FILE}")
            .push_caption("Figure", 1, "Overview")
            .push_caption("Table", 1, "Data")
            .push_paragraph(None, "{ATTR:Version.date} and {DIAG:Core.Main}")
            .push_caption("Figure", 2, "Detail")
            .push_paragraph(None, "{CLASS:Core.Terminal}");

        let captions = scan_captions(&mut doc, &CaptionLabels::default());
        assert_eq!(captions.len(), 3);

        let cursors = CursorList::scan(&doc, &captions);
        let seen: Vec<_> = cursors
            .iter()
            .map(|c| (c.placeholder().text().to_owned(), c.counts()))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("{FILE}".to_owned(), counts(0, 0)),
                ("{ATTR:Version.date}".to_owned(), counts(1, 1)),
                ("{DIAG:Core.Main}".to_owned(), counts(1, 1)),
                ("{CLASS:Core.Terminal}".to_owned(), counts(2, 1)),
            ]
        );
        let text = doc.text();
        let range = cursors.get(2).unwrap().range();
        assert_eq!(range.slice(&text), Some("{DIAG:Core.Main}"));
    }

    #[test]
    fn test_caption_added_advances_later_cursors() {
        let mut doc = FlowDocument::new();
        doc.push_paragraph(None, "{FILE}")
            .push_paragraph(None, "{FILE}")
            .push_paragraph(None, "{FILE}");
        let mut cursors = CursorList::scan(&doc, &[]);

        assert_eq!(cursors.caption_added(1, CaptionKind::Figure), 1);
        assert_eq!(cursors.caption_added(1, CaptionKind::Figure), 2);
        assert_eq!(cursors.caption_added(2, CaptionKind::Table), 1);

        let all: Vec<_> = cursors.iter().map(Cursor::counts).collect();
        assert_eq!(all, vec![counts(0, 0), counts(2, 0), counts(2, 1)]);
    }

    #[test]
    fn test_apply_edits_shifts_later_cursors_only() {
        let mut doc = FlowDocument::new();
        doc.push_paragraph(None, "{FILE} {FILE}")
            .push_paragraph(None, "{FILE}");
        let mut cursors = CursorList::scan(&doc, &[]);
        let before: Vec<_> = cursors.iter().map(Cursor::range).collect();

        // First placeholder grew by 4 bytes, then a 10-byte block was
        // inserted after its paragraph.
        let edits = [Edit::resize(6, 6, 10), Edit::resize(18, 0, 10)];
        cursors.apply_edits(0, &edits);

        let after: Vec<_> = cursors.iter().map(Cursor::range).collect();
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1].shifted(4));
        assert_eq!(after[2], before[2].shifted(14));
    }

    #[test]
    fn test_len_delta() {
        assert_eq!(len_delta(6, 10), 4);
        assert_eq!(len_delta(10, 6), -4);
        assert_eq!(len_delta(3, 3), 0);
    }
}
