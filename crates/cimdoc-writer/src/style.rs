//! Style resolution: pick a usable document style for every role.

use std::collections::BTreeMap;

use cimdoc_document::{StyleDef, StyleSet};

/// Deepest heading and TOC level.
pub const MAX_LEVEL: u8 = 9;

/// What a style is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleRole {
    /// Prefix: `Heading` resolves to `Heading 1` .. `Heading 9`.
    Heading,
    /// Prefix: `TOC` resolves to `TOC 1` .. `TOC 9`.
    Toc,
    Paragraph,
    Figure,
    TableHead,
    TableCell,
    FigureCaption,
    TableCaption,
}

impl StyleRole {
    pub const ALL: [Self; 8] = [
        Self::Heading,
        Self::Toc,
        Self::Paragraph,
        Self::Figure,
        Self::TableHead,
        Self::TableCell,
        Self::FigureCaption,
        Self::TableCaption,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Toc => "toc",
            Self::Paragraph => "paragraph",
            Self::Figure => "figure",
            Self::TableHead => "table_head",
            Self::TableCell => "table_cell",
            Self::FigureCaption => "figure_caption",
            Self::TableCaption => "table_caption",
        }
    }

    /// Style used when no candidates are configured.
    #[must_use]
    pub fn hard_default(self) -> &'static str {
        match self {
            Self::Heading => "Heading",
            Self::Toc => "TOC",
            Self::Paragraph | Self::Figure | Self::TableHead | Self::TableCell => "Normal",
            Self::FigureCaption | Self::TableCaption => "Caption",
        }
    }

    /// Prefix roles name a family of numbered styles.
    fn is_prefix(self) -> bool {
        matches!(self, Self::Heading | Self::Toc)
    }

    fn is_present(self, name: &str, existing: &StyleSet) -> bool {
        if self.is_prefix() {
            existing.contains_key(&format!("{name} 1"))
        } else {
            existing.contains_key(name)
        }
    }

    /// Styles to add when `name` is the default and missing.
    fn defaults(self, name: &str) -> Vec<(String, StyleDef)> {
        match self {
            Self::Heading => (1..=MAX_LEVEL)
                .map(|l| (format!("{name} {l}"), StyleDef::heading(l)))
                .collect(),
            Self::Toc => (1..=MAX_LEVEL)
                .map(|l| (format!("{name} {l}"), StyleDef::paragraph()))
                .collect(),
            _ => vec![(name.to_owned(), StyleDef::paragraph())],
        }
    }
}

/// Picks the style for each role from prioritized candidate lists.
///
/// Lifecycle per run: [`init_preferred`](Self::init_preferred) with the
/// configured lists, [`init_usable`](Self::init_usable) once the document is
/// open, [`reset`](Self::reset) at close. Resolution never fails: the last
/// candidate of every list (or the role's hard default) is the fallback and
/// is added to the document when missing.
#[derive(Debug, Default)]
pub struct StyleResolver {
    preferred: BTreeMap<StyleRole, Vec<String>>,
    resolved: BTreeMap<StyleRole, String>,
}

impl StyleResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record candidate lists. Roles without a (non-empty) list fall back to
    /// their hard default.
    pub fn init_preferred<I>(&mut self, per_role: I)
    where
        I: IntoIterator<Item = (StyleRole, Vec<String>)>,
    {
        self.preferred.clear();
        for (role, candidates) in per_role {
            let candidates: Vec<String> = candidates
                .into_iter()
                .filter(|c| !c.trim().is_empty())
                .collect();
            if !candidates.is_empty() {
                self.preferred.insert(role, candidates);
            }
        }
        for role in StyleRole::ALL {
            self.preferred
                .entry(role)
                .or_insert_with(|| vec![role.hard_default().to_owned()]);
        }
    }

    /// Resolve every role against the document's styles.
    ///
    /// Missing defaults are inserted into `existing`; the inserted styles are
    /// returned so the caller can add them to the document.
    pub fn init_usable(&mut self, existing: &mut StyleSet) -> Vec<(String, StyleDef)> {
        if self.preferred.is_empty() {
            self.init_preferred(std::iter::empty());
        }
        let mut inserted = Vec::new();
        self.resolved.clear();

        for (&role, candidates) in &self.preferred {
            let found = candidates.iter().find(|c| role.is_present(c, existing));
            let name = match found {
                Some(name) => name.clone(),
                None => {
                    let default = candidates
                        .last()
                        .map_or(role.hard_default(), String::as_str)
                        .to_owned();
                    for (style, def) in role.defaults(&default) {
                        if !existing.contains_key(&style) {
                            existing.insert(style.clone(), def);
                            inserted.push((style, def));
                        }
                    }
                    tracing::info!(role = role.as_str(), style = %default, "Using default style");
                    default
                }
            };
            tracing::debug!(role = role.as_str(), style = %name, "Resolved style");
            self.resolved.insert(role, name);
        }
        inserted
    }

    /// Forget resolved styles. Preferred lists are kept.
    pub fn reset(&mut self) {
        self.resolved.clear();
    }

    /// Resolved style (or prefix) for `role`.
    #[must_use]
    pub fn style(&self, role: StyleRole) -> &str {
        self.resolved
            .get(&role)
            .map_or(role.hard_default(), String::as_str)
    }

    /// Heading style for `level`, clamped to `1..=9`.
    #[must_use]
    pub fn heading(&self, level: u8) -> String {
        format!(
            "{} {}",
            self.style(StyleRole::Heading),
            level.clamp(1, MAX_LEVEL)
        )
    }

    /// Role to style mapping, for reporting.
    #[must_use]
    pub fn resolved(&self) -> &BTreeMap<StyleRole, String> {
        &self.resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|&s| s.to_owned()).collect()
    }

    fn template_styles() -> StyleSet {
        let mut styles = StyleSet::new();
        for l in 1..=MAX_LEVEL {
            styles.insert(format!("Titre {l}"), StyleDef::heading(l));
        }
        styles.insert("Normal".to_owned(), StyleDef::paragraph());
        styles.insert("TableCell".to_owned(), StyleDef::paragraph());
        styles
    }

    fn resolver() -> StyleResolver {
        let mut resolver = StyleResolver::new();
        resolver.init_preferred([
            (StyleRole::Heading, names(&["Heading", "Titre"])),
            (StyleRole::Paragraph, names(&["Body Text", "Normal"])),
            (StyleRole::TableCell, names(&["TableCell", "Normal"])),
            (StyleRole::FigureCaption, names(&["Caption"])),
        ]);
        resolver
    }

    #[test]
    fn test_first_present_candidate_wins() {
        let mut resolver = resolver();
        let mut styles = template_styles();
        resolver.init_usable(&mut styles);

        assert_eq!(resolver.style(StyleRole::Heading), "Titre");
        assert_eq!(resolver.heading(2), "Titre 2");
        assert_eq!(resolver.style(StyleRole::Paragraph), "Normal");
        assert_eq!(resolver.style(StyleRole::TableCell), "TableCell");
    }

    #[test]
    fn test_missing_default_is_inserted() {
        let mut resolver = resolver();
        let mut styles = template_styles();
        let inserted = resolver.init_usable(&mut styles);

        let inserted: Vec<_> = inserted.into_iter().map(|(name, _)| name).collect();
        assert!(inserted.contains(&"Caption".to_owned()));
        assert!(inserted.contains(&"TOC 1".to_owned()));
        assert!(inserted.contains(&"TOC 9".to_owned()));
        assert!(styles.contains_key("Caption"));
        assert_eq!(resolver.style(StyleRole::FigureCaption), "Caption");
        assert_eq!(resolver.style(StyleRole::Figure), "Normal");
    }

    #[test]
    fn test_default_heading_family_has_outline_levels() {
        let mut resolver = StyleResolver::new();
        resolver.init_preferred([(StyleRole::Heading, names(&["Heading"]))]);
        let mut styles = StyleSet::new();
        resolver.init_usable(&mut styles);

        assert_eq!(styles.get("Heading 3"), Some(&StyleDef::heading(3)));
        assert_eq!(resolver.heading(0), "Heading 1");
        assert_eq!(resolver.heading(12), "Heading 9");
    }

    #[test]
    fn test_init_usable_is_idempotent() {
        let mut resolver = resolver();
        let mut styles = template_styles();
        resolver.init_usable(&mut styles);
        let first = resolver.resolved().clone();

        let inserted = resolver.init_usable(&mut styles);
        assert_eq!(resolver.resolved(), &first);
        assert!(inserted.is_empty());

        let mut fresh = template_styles();
        resolver.init_usable(&mut fresh);
        assert_eq!(resolver.resolved(), &first);
    }

    #[test]
    fn test_blank_candidates_fall_back_to_hard_default() {
        let mut resolver = StyleResolver::new();
        resolver.init_preferred([(StyleRole::Paragraph, names(&["", "  "]))]);
        let mut styles = StyleSet::new();
        resolver.init_usable(&mut styles);
        assert_eq!(resolver.style(StyleRole::Paragraph), "Normal");
    }

    #[test]
    fn test_reset_clears_resolution() {
        let mut resolver = resolver();
        let mut styles = template_styles();
        resolver.init_usable(&mut styles);
        resolver.reset();
        assert!(resolver.resolved().is_empty());
        assert_eq!(resolver.style(StyleRole::Heading), "Heading");
    }
}
