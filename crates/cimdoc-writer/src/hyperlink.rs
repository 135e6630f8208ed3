//! Second pass: turn hyperlink placeholders into links or plain text.

use cimdoc_document::Document;

use crate::bookmark::BookmarkRegistry;
use crate::cursor::len_delta;
use crate::placeholder::hyperlink_matches;

/// Outcome of the hyperlink pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LinkStats {
    pub hyperlinks: usize,
    pub plain: usize,
    pub failures: Vec<String>,
}

/// Replace every hyperlink placeholder with its display text, linked to its
/// bookmark when that bookmark was written in this run.
///
/// Matches are processed front to back; each replacement shifts the ones
/// after it by a known amount.
pub(crate) fn write_hyperlinks<D: Document + ?Sized>(
    doc: &mut D,
    bookmarks: &BookmarkRegistry,
) -> LinkStats {
    let text = doc.text();
    let matches: Vec<_> = hyperlink_matches(&text).collect();
    let mut stats = LinkStats::default();
    let mut delta = 0isize;

    for (range, link) in matches {
        let range = range.shifted(delta);
        let display = match doc.replace_text(&range, &link.display) {
            Ok(display) => display,
            Err(e) => {
                tracing::error!(bookmark = %link.bookmark, error = %e, "Failed to resolve hyperlink");
                stats
                    .failures
                    .push(format!("[[HLINK:{}|{}]]: {e}", link.display, link.bookmark));
                continue;
            }
        };
        delta += len_delta(range.len(), display.len());

        if !bookmarks.is_available(&link.bookmark) {
            tracing::debug!(bookmark = %link.bookmark, "Target not in this document, plain text");
            stats.plain += 1;
            continue;
        }
        match doc.make_hyperlink(&display, &link.bookmark) {
            Ok(()) => stats.hyperlinks += 1,
            Err(e) => {
                tracing::error!(bookmark = %link.bookmark, error = %e, "Failed to create hyperlink");
                stats.plain += 1;
                stats.failures.push(format!("{}: {e}", link.display));
            }
        }
    }
    tracing::debug!(
        hyperlinks = stats.hyperlinks,
        plain = stats.plain,
        "Resolved hyperlink placeholders"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use cimdoc_document::FlowDocument;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_available_bookmark_becomes_hyperlink() {
        let mut doc = FlowDocument::new();
        doc.push_paragraph(None, "Terminal")
            .push_table(&[&["t", "[[HLINK:Terminal|Core_Terminal]]"]]);
        let target = doc.find("Terminal").unwrap();
        doc.add_bookmark(&target, "Core_Terminal").unwrap();

        let mut bookmarks = BookmarkRegistry::new();
        bookmarks.mark_available("Core_Terminal");
        let stats = write_hyperlinks(&mut doc, &bookmarks);

        assert_eq!(stats.hyperlinks, 1);
        assert_eq!(stats.plain, 0);
        assert_eq!(doc.hyperlink_count(), 1);
        assert_eq!(doc.text(), "Terminal\nt\tTerminal\t\n");
    }

    #[test]
    fn test_unavailable_bookmark_becomes_plain_text() {
        let mut doc = FlowDocument::new();
        doc.push_paragraph(
            None,
            "Inheritance path = Breaker : [[HLINK:Switch|Wires_Switch]] : [[HLINK:Equipment|Core_Equipment]]",
        );
        let mut bookmarks = BookmarkRegistry::new();
        bookmarks.register("Wires_Switch");
        bookmarks.mark_available("Core_Equipment");

        let stats = write_hyperlinks(&mut doc, &bookmarks);
        assert_eq!(stats.plain, 1);
        assert_eq!(stats.hyperlinks, 1);
        assert_eq!(doc.hyperlink_count(), 1);
        assert_eq!(
            doc.text(),
            "Inheritance path = Breaker : Switch : Equipment\n"
        );
    }

    #[test]
    fn test_no_placeholders() {
        let mut doc = FlowDocument::new();
        doc.push_paragraph(None, "plain");
        let stats = write_hyperlinks(&mut doc, &BookmarkRegistry::new());
        assert_eq!(stats, LinkStats::default());
        assert_eq!(doc.text(), "plain\n");
    }
}
