//! Bookmark identifiers for class headings.

use sha2::{Digest, Sha256};

/// Longest bookmark name word processors accept.
pub const MAX_BOOKMARK_LEN: usize = 40;

/// Hex digits of the hash suffix appended to lossy identifiers.
const HASH_SUFFIX_LEN: usize = 8;

/// Stable bookmark identifier for a qualified class name.
///
/// The result holds only ASCII letters, digits and underscores, starts with
/// a letter and is at most [`MAX_BOOKMARK_LEN`] bytes long. Dots become
/// underscores. Any other rewrite (underscores, other separators, non-ASCII
/// letters, a leading `B`) or truncation loses information, so those
/// identifiers get a hash of the full name as suffix and distinct classes
/// keep distinct bookmarks.
#[must_use]
pub fn bookmark_id(qualified_name: &str) -> String {
    let plain = qualified_name.starts_with(|c: char| c.is_ascii_alphabetic())
        && qualified_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.');
    let mut id: String = qualified_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !id.starts_with(|c: char| c.is_ascii_alphabetic()) {
        id.insert(0, 'B');
    }
    if !plain || id.len() > MAX_BOOKMARK_LEN {
        let hash = hex::encode(Sha256::digest(qualified_name.as_bytes()));
        id.truncate(MAX_BOOKMARK_LEN - HASH_SUFFIX_LEN - 1);
        id.push('_');
        id.push_str(&hash[..HASH_SUFFIX_LEN]);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_id_dotted_names_stay_readable() {
        assert_eq!(bookmark_id("Core.Terminal"), "Core_Terminal");
        assert_eq!(bookmark_id("IEC61850.LN0"), "IEC61850_LN0");
    }

    #[test]
    fn test_bookmark_id_other_separators_get_hash() {
        assert_eq!(bookmark_id("Wires::AC Line"), "Wires__AC_Line_91bc7f7e");
    }

    #[test]
    fn test_bookmark_id_underscores_do_not_collide_with_dots() {
        let underscored = bookmark_id("Core.My_Class");
        assert_eq!(underscored, "Core_My_Class_ffee9319");
        assert_ne!(underscored, bookmark_id("Core.My.Class"));
    }

    #[test]
    fn test_bookmark_id_starts_with_letter() {
        assert_eq!(bookmark_id("61850.LN"), "B61850_LN_2a17555e");
        assert_ne!(bookmark_id("61850.LN"), bookmark_id("B61850.LN"));
        assert_eq!(bookmark_id(""), "B_e3b0c442");
    }

    #[test]
    fn test_bookmark_id_truncates_with_hash() {
        let long = "IEC61850.DomainLNs.LNGroupZ.ZLIN.PowerTransformerInstance";
        let other = "IEC61850.DomainLNs.LNGroupZ.ZLIN.PowerTransformerInstance2";
        let a = bookmark_id(long);
        let b = bookmark_id(other);
        assert_eq!(a.len(), MAX_BOOKMARK_LEN);
        assert_ne!(a, b);
        assert!(a.starts_with("IEC61850_DomainLNs_LNGroupZ_"));
        assert_eq!(a, bookmark_id(long));
    }

    #[test]
    fn test_bookmark_id_non_ascii() {
        let id = bookmark_id("Paket.Größe");
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert_eq!(id, "Paket_Gr__e_c1c28d6c");
    }
}
