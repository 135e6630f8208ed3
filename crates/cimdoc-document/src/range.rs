//! Anchors into a document's linear text.

use std::fmt;

/// A span `[start, end)` of a document's linear text, in bytes.
///
/// A `Range` is a plain value: it never tracks edits on its own. Whoever
/// holds one is responsible for shifting it when content before it changes
/// (see [`shifted`](Self::shifted)). Stored anchors are always independent
/// copies obtained with [`duplicate`](Self::duplicate); nothing aliases a
/// range that another structure may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    start: usize,
    end: usize,
}

impl Range {
    /// Create a range. `end` is clamped so that it is never before `start`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// A collapsed range at `offset`.
    #[must_use]
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// An independent snapshot of this range.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        *self
    }

    /// This range moved by `delta` bytes.
    ///
    /// Saturates at zero; a negative shift past the document start means the
    /// caller applied an edit that did not precede this range.
    #[must_use]
    pub fn shifted(&self, delta: isize) -> Self {
        let shift = |v: usize| v.saturating_add_signed(delta);
        Self::new(shift(self.start), shift(self.end))
    }

    /// The covered slice of `text`, if the range is in bounds.
    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_end() {
        let r = Range::new(5, 2);
        assert_eq!(r.start(), 5);
        assert_eq!(r.end(), 5);
        assert!(r.is_empty());
    }

    #[test]
    fn test_duplicate_is_independent() {
        let original = Range::new(1, 4);
        let copy = original.duplicate().shifted(9);
        assert_eq!(original, Range::new(1, 4));
        assert_eq!(copy, Range::new(10, 13));
    }

    #[test]
    fn test_shifted() {
        let r = Range::new(10, 15);
        assert_eq!(r.shifted(5), Range::new(15, 20));
        assert_eq!(r.shifted(-4), Range::new(6, 11));
        assert_eq!(r.shifted(-100), Range::at(0));
    }

    #[test]
    fn test_slice() {
        let r = Range::new(6, 11);
        assert_eq!(r.slice("hello world"), Some("world"));
        assert_eq!(Range::new(6, 20).slice("hello world"), None);
    }
}
