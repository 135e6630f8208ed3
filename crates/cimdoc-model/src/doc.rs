//! Documentation records for packages, classes and diagrams.

use serde::{Deserialize, Serialize};

/// A diagram owned by a package or class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiagramDoc {
    pub name: String,
    /// Image file, relative to the model file.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// One row of a property table: an attribute, association end or operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertiesDoc {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Bookmark of the type's class, when the type is a documented class.
    #[serde(skip)]
    pub type_bookmark: Option<String>,
    #[serde(default)]
    pub multiplicity: String,
    #[serde(default)]
    pub description: String,
    /// Initial value (constants).
    #[serde(default)]
    pub value: Option<String>,
}

/// A documented class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassDoc {
    pub name: String,
    /// `Package.Sub.Class`, filled in when the model is indexed.
    #[serde(skip)]
    pub qualified_name: String,
    #[serde(default)]
    pub description: String,
    /// Superclasses, nearest first.
    #[serde(default, alias = "superclasses")]
    pub inheritance_path: Vec<String>,
    #[serde(default)]
    pub diagrams: Vec<DiagramDoc>,
    #[serde(default)]
    pub attributes: Vec<PropertiesDoc>,
    #[serde(default)]
    pub association_ends: Vec<PropertiesDoc>,
    #[serde(default)]
    pub operations: Vec<PropertiesDoc>,
}

impl ClassDoc {
    /// Bookmark identifier for this class's heading.
    #[must_use]
    pub fn bookmark(&self) -> String {
        crate::bookmark_id(&self.qualified_name)
    }
}

/// A documented package with its classes and nested packages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageDoc {
    pub name: String,
    #[serde(skip)]
    pub qualified_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub diagrams: Vec<DiagramDoc>,
    #[serde(default)]
    pub classes: Vec<ClassDoc>,
    #[serde(default)]
    pub packages: Vec<PackageDoc>,
}

impl PackageDoc {
    /// All classes in this package and its nested packages, depth first.
    pub fn all_classes(&self) -> Box<dyn Iterator<Item = &ClassDoc> + '_> {
        Box::new(
            self.classes
                .iter()
                .chain(self.packages.iter().flat_map(PackageDoc::all_classes)),
        )
    }

    /// Assign qualified names below `parent` (empty for top-level packages).
    pub(crate) fn qualify(&mut self, parent: &str) {
        self.qualified_name = if parent.is_empty() {
            self.name.clone()
        } else {
            format!("{parent}.{}", self.name)
        };
        for class in &mut self.classes {
            class.qualified_name = format!("{}.{}", self.qualified_name, class.name);
        }
        let qualified = self.qualified_name.clone();
        for package in &mut self.packages {
            package.qualify(&qualified);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn class(name: &str) -> ClassDoc {
        ClassDoc {
            name: name.to_owned(),
            ..ClassDoc::default()
        }
    }

    #[test]
    fn test_qualify_and_all_classes() {
        let mut pkg = PackageDoc {
            name: "Wires".to_owned(),
            classes: vec![class("Line")],
            packages: vec![PackageDoc {
                name: "Switching".to_owned(),
                classes: vec![class("Breaker")],
                ..PackageDoc::default()
            }],
            ..PackageDoc::default()
        };
        pkg.qualify("IEC61970");

        let names: Vec<_> = pkg
            .all_classes()
            .map(|c| c.qualified_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["IEC61970.Wires.Line", "IEC61970.Wires.Switching.Breaker"]
        );
        assert_eq!(pkg.packages[0].qualified_name, "IEC61970.Wires.Switching");
    }

    #[test]
    fn test_class_bookmark() {
        let mut c = class("Terminal");
        c.qualified_name = "Core.Terminal".to_owned();
        assert_eq!(c.bookmark(), "Core_Terminal");
    }
}
