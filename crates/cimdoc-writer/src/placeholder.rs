//! Placeholder grammar.
//!
//! Template authors write content placeholders: `{KEYWORD}` or
//! `{KEYWORD:arguments}`. While writing content the engine emits hyperlink
//! placeholders `[[HLINK:display|bookmark]]`, which a second pass turns into
//! hyperlinks or plain text.

use std::fmt;
use std::sync::LazyLock;

use cimdoc_document::Range;
use regex::Regex;

/// Content placeholder anywhere in the text. Never spans a paragraph or cell.
static CONTENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Z][A-Z0-9_]*)(?::([^{}\r\n\t]*))?\}").expect("invalid placeholder regex")
});

static HYPERLINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[HLINK:([^|\]\r\n\t]+)\|([^\]\r\n\t]+)\]\]").expect("invalid hyperlink regex")
});

/// Placeholder keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    File,
    Attribute,
    IecNsName,
    Diagram,
    DiagNote,
    PresConditions,
    Fcs,
    TrgOps,
    Abbreviations,
    SclEnums,
    Package,
    Class,
    LnMapPackage,
    DataIndex,
}

impl Keyword {
    pub const ALL: [Self; 14] = [
        Self::File,
        Self::Attribute,
        Self::IecNsName,
        Self::Diagram,
        Self::DiagNote,
        Self::PresConditions,
        Self::Fcs,
        Self::TrgOps,
        Self::Abbreviations,
        Self::SclEnums,
        Self::Package,
        Self::Class,
        Self::LnMapPackage,
        Self::DataIndex,
    ];

    /// The keyword as written in templates.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "FILE",
            Self::Attribute => "ATTR",
            Self::IecNsName => "IEC61850_NSNAME",
            Self::Diagram => "DIAG",
            Self::DiagNote => "DIAG_NOTE",
            Self::PresConditions => "PRES_CONDITIONS",
            Self::Fcs => "FCS",
            Self::TrgOps => "TRGOPS",
            Self::Abbreviations => "ABBREVIATIONS",
            Self::SclEnums => "SCL_ENUMS",
            Self::Package => "PACKAGE",
            Self::Class => "CLASS",
            Self::LnMapPackage => "LNMAP_PACKAGE",
            Self::DataIndex => "DATA_INDEX",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Full syntax, for diagnostics.
    #[must_use]
    pub fn syntax(self) -> &'static str {
        match self {
            Self::File => "{FILE}",
            Self::Attribute => "{ATTR:<Class>.<attribute>}",
            Self::IecNsName => "{IEC61850_NSNAME:<namespace>}",
            Self::Diagram => "{DIAG:<Owner>.<Diagram>}",
            Self::DiagNote => "{DIAG_NOTE:<Owner>.<Diagram>}",
            Self::PresConditions => "{PRES_CONDITIONS:<Package>}",
            Self::Fcs => "{FCS:<Package>}",
            Self::TrgOps => "{TRGOPS:<Package>}",
            Self::Abbreviations => "{ABBREVIATIONS:<Package>}",
            Self::SclEnums => "{SCL_ENUMS:<Package>}",
            Self::Package => "{PACKAGE:<Package>}",
            Self::Class => "{CLASS:<qualified.Class>}",
            Self::LnMapPackage => "{LNMAP_PACKAGE:<Package>}",
            Self::DataIndex => "{DATA_INDEX:<Package>}",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package placeholders that expand into generated tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageTable {
    PresConditions,
    Fcs,
    TrgOps,
    Abbreviations,
    SclEnums,
    LnMap,
    DataIndex,
}

impl PackageTable {
    #[must_use]
    pub fn keyword(self) -> Keyword {
        match self {
            Self::PresConditions => Keyword::PresConditions,
            Self::Fcs => Keyword::Fcs,
            Self::TrgOps => Keyword::TrgOps,
            Self::Abbreviations => Keyword::Abbreviations,
            Self::SclEnums => Keyword::SclEnums,
            Self::LnMap => Keyword::LnMapPackage,
            Self::DataIndex => Keyword::DataIndex,
        }
    }
}

/// What a placeholder asks for, with its tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    File,
    Attribute { class: String, attribute: String },
    IecNsName { name: String },
    Diagram { owner: String, diagram: String },
    DiagNote { owner: String, diagram: String },
    Package { name: String },
    PackageTable { table: PackageTable, package: String },
    Class { qualified_name: String },
    Unsupported,
}

/// A parsed content placeholder.
///
/// Immutable once parsed, except for the error text (set on a lookup miss)
/// and the text that finally replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    text: String,
    kind: PlaceholderKind,
    error_text: Option<String>,
    replaced_text: Option<String>,
}

impl Placeholder {
    /// Parse matched template text.
    ///
    /// Text that does not follow any known syntax parses as
    /// [`PlaceholderKind::Unsupported`] with a diagnostic listing the
    /// supported formats.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let kind = parse_kind(text);
        let error_text = (kind == PlaceholderKind::Unsupported).then(|| {
            format!(
                "[Unsupported placeholder '{text}'. Supported formats: {}]",
                Self::supported_formats().join(", ")
            )
        });
        Self {
            text: text.to_owned(),
            kind,
            error_text,
            replaced_text: None,
        }
    }

    /// Every supported placeholder syntax.
    #[must_use]
    pub fn supported_formats() -> Vec<&'static str> {
        Keyword::ALL.iter().map(|k| k.syntax()).collect()
    }

    /// The raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> &PlaceholderKind {
        &self.kind
    }

    /// Keyword, or `None` for unsupported text.
    #[must_use]
    pub fn keyword(&self) -> Option<Keyword> {
        Some(match &self.kind {
            PlaceholderKind::File => Keyword::File,
            PlaceholderKind::Attribute { .. } => Keyword::Attribute,
            PlaceholderKind::IecNsName { .. } => Keyword::IecNsName,
            PlaceholderKind::Diagram { .. } => Keyword::Diagram,
            PlaceholderKind::DiagNote { .. } => Keyword::DiagNote,
            PlaceholderKind::Package { .. } => Keyword::Package,
            PlaceholderKind::PackageTable { table, .. } => table.keyword(),
            PlaceholderKind::Class { .. } => Keyword::Class,
            PlaceholderKind::Unsupported => return None,
        })
    }

    /// The one or two tokens of the placeholder.
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        match &self.kind {
            PlaceholderKind::File | PlaceholderKind::Unsupported => Vec::new(),
            PlaceholderKind::Attribute { class, attribute } => vec![class, attribute],
            PlaceholderKind::Diagram { owner, diagram }
            | PlaceholderKind::DiagNote { owner, diagram } => vec![owner, diagram],
            PlaceholderKind::IecNsName { name } | PlaceholderKind::Package { name } => vec![name],
            PlaceholderKind::PackageTable { package, .. } => vec![package],
            PlaceholderKind::Class { qualified_name } => vec![qualified_name],
        }
    }

    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    pub(crate) fn set_error_text(&mut self, text: impl Into<String>) {
        self.error_text = Some(text.into());
    }

    /// What the placeholder was replaced with, once written.
    #[must_use]
    pub fn replaced_text(&self) -> Option<&str> {
        self.replaced_text.as_deref()
    }

    pub(crate) fn set_replaced_text(&mut self, text: impl Into<String>) {
        self.replaced_text = Some(text.into());
    }
}

fn parse_kind(text: &str) -> PlaceholderKind {
    let Some(caps) = CONTENT_PATTERN.captures(text) else {
        return PlaceholderKind::Unsupported;
    };
    if caps.get(0).map(|m| m.as_str()) != Some(text) {
        return PlaceholderKind::Unsupported;
    }
    let Some(keyword) = caps.get(1).and_then(|m| Keyword::parse(m.as_str())) else {
        return PlaceholderKind::Unsupported;
    };
    let args = caps.get(2).map(|m| m.as_str().trim());

    let single = |args: Option<&str>| args.filter(|a| !a.is_empty()).map(str::to_owned);
    let kind = match keyword {
        Keyword::File => args.is_none().then_some(PlaceholderKind::File),
        Keyword::Attribute => split_pair(args, str::rsplit_once)
            .map(|(class, attribute)| PlaceholderKind::Attribute { class, attribute }),
        Keyword::IecNsName => single(args).map(|name| PlaceholderKind::IecNsName { name }),
        Keyword::Diagram => split_pair(args, str::split_once)
            .map(|(owner, diagram)| PlaceholderKind::Diagram { owner, diagram }),
        Keyword::DiagNote => split_pair(args, str::split_once)
            .map(|(owner, diagram)| PlaceholderKind::DiagNote { owner, diagram }),
        Keyword::Package => single(args).map(|name| PlaceholderKind::Package { name }),
        Keyword::Class => {
            single(args).map(|qualified_name| PlaceholderKind::Class { qualified_name })
        }
        Keyword::PresConditions => package_table(PackageTable::PresConditions, single(args)),
        Keyword::Fcs => package_table(PackageTable::Fcs, single(args)),
        Keyword::TrgOps => package_table(PackageTable::TrgOps, single(args)),
        Keyword::Abbreviations => package_table(PackageTable::Abbreviations, single(args)),
        Keyword::SclEnums => package_table(PackageTable::SclEnums, single(args)),
        Keyword::LnMapPackage => package_table(PackageTable::LnMap, single(args)),
        Keyword::DataIndex => package_table(PackageTable::DataIndex, single(args)),
    };
    kind.unwrap_or(PlaceholderKind::Unsupported)
}

fn package_table(table: PackageTable, package: Option<String>) -> Option<PlaceholderKind> {
    package.map(|package| PlaceholderKind::PackageTable { table, package })
}

/// Split `a.b` into two non-empty tokens.
fn split_pair(
    args: Option<&str>,
    split: fn(&str, char) -> Option<(&str, &str)>,
) -> Option<(String, String)> {
    let (a, b) = split(args?, '.')?;
    let (a, b) = (a.trim(), b.trim());
    (!a.is_empty() && !b.is_empty()).then(|| (a.to_owned(), b.to_owned()))
}

/// Content placeholder matches in `text`, in order.
pub(crate) fn content_matches(text: &str) -> impl Iterator<Item = (Range, &str)> {
    CONTENT_PATTERN
        .find_iter(text)
        .map(|m| (Range::new(m.start(), m.end()), m.as_str()))
}

/// A hyperlink placeholder emitted during content writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperlinkPlaceholder {
    pub display: String,
    pub bookmark: String,
}

impl HyperlinkPlaceholder {
    /// Placeholder text for a link to `bookmark` showing `display`.
    #[must_use]
    pub fn format(display: &str, bookmark: &str) -> String {
        format!("[[HLINK:{display}|{bookmark}]]")
    }

    /// Parse a complete hyperlink placeholder.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let caps = HYPERLINK_PATTERN.captures(text)?;
        if caps.get(0)?.as_str() != text {
            return None;
        }
        Some(Self {
            display: caps.get(1)?.as_str().to_owned(),
            bookmark: caps.get(2)?.as_str().to_owned(),
        })
    }
}

/// Hyperlink placeholder matches in `text`, in order.
pub(crate) fn hyperlink_matches(text: &str) -> impl Iterator<Item = (Range, HyperlinkPlaceholder)> {
    HYPERLINK_PATTERN.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        Some((
            Range::new(whole.start(), whole.end()),
            HyperlinkPlaceholder {
                display: caps.get(1)?.as_str().to_owned(),
                bookmark: caps.get(2)?.as_str().to_owned(),
            },
        ))
    })
}

/// A lookup miss: what to write into the document and what to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human-readable description.
    pub message: String,
    /// Text written in place of the placeholder.
    pub text: String,
}

impl Diagnostic {
    /// `<what> '<name>' not found`.
    #[must_use]
    pub fn not_found(what: &str, name: &str) -> Self {
        let message = format!("{what} '{name}' not found");
        Self {
            text: format!("[{message}]"),
            message,
        }
    }

    /// Content was found but could not be written.
    #[must_use]
    pub fn failed(placeholder: &Placeholder, error: &dyn fmt::Display) -> Self {
        let message = error.to_string();
        Self {
            text: format!("[Failed to write '{}': {message}]", placeholder.text()),
            message,
        }
    }

    /// Diagnostic for unsupported placeholder text.
    #[must_use]
    pub fn unsupported(placeholder: &Placeholder) -> Self {
        let message = format!("Unsupported placeholder '{}'", placeholder.text());
        let text = placeholder
            .error_text()
            .map_or_else(|| format!("[{message}]"), str::to_owned);
        Self { message, text }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind(text: &str) -> PlaceholderKind {
        Placeholder::parse(text).kind
    }

    #[test]
    fn test_parse_file() {
        assert_eq!(kind("{FILE}"), PlaceholderKind::File);
        assert_eq!(kind("{FILE:x}"), PlaceholderKind::Unsupported);
    }

    #[test]
    fn test_parse_attribute_splits_at_last_dot() {
        assert_eq!(
            kind("{ATTR:IEC61970.Core.Version.date}"),
            PlaceholderKind::Attribute {
                class: "IEC61970.Core.Version".to_owned(),
                attribute: "date".to_owned(),
            }
        );
        assert_eq!(kind("{ATTR:Version}"), PlaceholderKind::Unsupported);
        assert_eq!(kind("{ATTR:Version.}"), PlaceholderKind::Unsupported);
    }

    #[test]
    fn test_parse_diagram_splits_at_first_dot() {
        assert_eq!(
            kind("{DIAG:Core.Main v1.2}"),
            PlaceholderKind::Diagram {
                owner: "Core".to_owned(),
                diagram: "Main v1.2".to_owned(),
            }
        );
        assert_eq!(
            kind("{DIAG_NOTE: Core . Main }"),
            PlaceholderKind::DiagNote {
                owner: "Core".to_owned(),
                diagram: "Main".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_single_token_kinds() {
        assert_eq!(
            kind("{IEC61850_NSNAME:IEC61850_7_4}"),
            PlaceholderKind::IecNsName {
                name: "IEC61850_7_4".to_owned()
            }
        );
        assert_eq!(
            kind("{PACKAGE:Wires}"),
            PlaceholderKind::Package {
                name: "Wires".to_owned()
            }
        );
        assert_eq!(
            kind("{CLASS:IEC61970.Core.Terminal}"),
            PlaceholderKind::Class {
                qualified_name: "IEC61970.Core.Terminal".to_owned()
            }
        );
        assert_eq!(
            kind("{LNMAP_PACKAGE:LogicalNodes}"),
            PlaceholderKind::PackageTable {
                table: PackageTable::LnMap,
                package: "LogicalNodes".to_owned()
            }
        );
        assert_eq!(kind("{PACKAGE:}"), PlaceholderKind::Unsupported);
        assert_eq!(kind("{PACKAGE}"), PlaceholderKind::Unsupported);
    }

    #[test]
    fn test_every_keyword_parses_with_its_syntax_shape() {
        for keyword in Keyword::ALL {
            let text = match keyword {
                Keyword::File => "{FILE}".to_owned(),
                Keyword::Attribute | Keyword::Diagram | Keyword::DiagNote => {
                    format!("{{{keyword}:A.b}}")
                }
                _ => format!("{{{keyword}:A}}"),
            };
            let placeholder = Placeholder::parse(&text);
            assert_eq!(placeholder.keyword(), Some(keyword), "{text}");
            assert!(placeholder.error_text().is_none());
        }
    }

    #[test]
    fn test_unsupported_lists_formats() {
        let placeholder = Placeholder::parse("{CHAPTER:Intro}");
        assert_eq!(placeholder.kind(), &PlaceholderKind::Unsupported);
        assert_eq!(placeholder.keyword(), None);
        let error = placeholder.error_text().unwrap();
        assert!(error.contains("{CHAPTER:Intro}"));
        for format in Placeholder::supported_formats() {
            assert!(error.contains(format), "missing {format}");
        }
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            Placeholder::parse("{ATTR:Terminal.name}").tokens(),
            vec!["Terminal", "name"]
        );
        assert_eq!(Placeholder::parse("{SCL_ENUMS:Enums}").tokens(), vec!["Enums"]);
        assert!(Placeholder::parse("{FILE}").tokens().is_empty());
    }

    #[test]
    fn test_content_matches() {
        let text = "a {FILE} b {ATTR:X.y}\n{not} {DIAG:A.\nB}";
        let found: Vec<_> = content_matches(text).map(|(_, t)| t).collect();
        assert_eq!(found, vec!["{FILE}", "{ATTR:X.y}"]);
        let (range, _) = content_matches(text).next().unwrap();
        assert_eq!(range, Range::new(2, 8));
    }

    #[test]
    fn test_hyperlink_placeholder() {
        let text = HyperlinkPlaceholder::format("Terminal", "Core_Terminal");
        assert_eq!(text, "[[HLINK:Terminal|Core_Terminal]]");
        assert_eq!(
            HyperlinkPlaceholder::parse(&text),
            Some(HyperlinkPlaceholder {
                display: "Terminal".to_owned(),
                bookmark: "Core_Terminal".to_owned(),
            })
        );
        assert_eq!(HyperlinkPlaceholder::parse("{CLASS:Terminal}"), None);

        let doc = format!("x\t{text}\t\ny [[HLINK:A|a]]\n");
        let found: Vec<_> = hyperlink_matches(&doc)
            .map(|(r, h)| (r.start(), h.display))
            .collect();
        assert_eq!(found, vec![(2, "Terminal".to_owned()), (38, "A".to_owned())]);
    }

    #[test]
    fn test_diagnostics() {
        let miss = Diagnostic::not_found("Attribute", "Terminal.name");
        assert_eq!(miss.text, "[Attribute 'Terminal.name' not found]");
        assert_eq!(miss.to_string(), "Attribute 'Terminal.name' not found");

        let unsupported = Diagnostic::unsupported(&Placeholder::parse("{NOPE}"));
        assert!(unsupported.text.starts_with("[Unsupported placeholder '{NOPE}'."));
    }
}
