//! Tables generated from a package for the package table placeholders.

use std::collections::{BTreeMap, BTreeSet};

use cimdoc_model::PackageDoc;

use crate::placeholder::PackageTable;

/// A captioned table ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GeneratedTable {
    pub caption: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl GeneratedTable {
    fn new(caption: String, header: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            caption,
            header: header.iter().map(|&h| h.to_owned()).collect(),
            rows,
        }
    }
}

/// Tables for `table` built from `package`. Tables without rows are left out.
pub(crate) fn package_tables(table: PackageTable, package: &PackageDoc) -> Vec<GeneratedTable> {
    let tables = match table {
        PackageTable::PresConditions => vec![term_table(
            package,
            "Conditions for element presence",
            ["Condition", "Definition"],
        )],
        PackageTable::Fcs => vec![term_table(package, "Functional constraints", ["FC", "Semantic"])],
        PackageTable::TrgOps => vec![term_table(package, "Trigger options", ["TrgOp", "Semantic"])],
        PackageTable::Abbreviations => vec![term_table(
            package,
            "Abbreviations",
            ["Term", "Description"],
        )],
        PackageTable::SclEnums => enum_tables(package),
        PackageTable::LnMap => vec![ln_map(package)],
        PackageTable::DataIndex => vec![data_index(package)],
    };
    tables
        .into_iter()
        .filter(|t| {
            if t.rows.is_empty() {
                tracing::warn!(
                    package = %package.qualified_name,
                    table = %t.caption,
                    "No rows, table skipped"
                );
            }
            !t.rows.is_empty()
        })
        .collect()
}

/// Name and description of every attribute of every class.
fn term_table(package: &PackageDoc, caption: &str, header: [&str; 2]) -> GeneratedTable {
    let rows = package
        .all_classes()
        .flat_map(|class| class.attributes.iter())
        .map(|attr| vec![attr.name.clone(), attr.description.clone()])
        .collect();
    GeneratedTable::new(caption.to_owned(), &header, rows)
}

fn enum_tables(package: &PackageDoc) -> Vec<GeneratedTable> {
    package
        .all_classes()
        .filter(|class| !class.attributes.is_empty())
        .map(|class| {
            let rows = class
                .attributes
                .iter()
                .map(|literal| {
                    vec![
                        literal.name.clone(),
                        literal.value.clone().unwrap_or_default(),
                        literal.description.clone(),
                    ]
                })
                .collect();
            GeneratedTable::new(
                format!("Literals of {}", class.name),
                &["Literal", "Value", "Description"],
                rows,
            )
        })
        .collect()
}

/// Every class with the package that owns it.
fn ln_map(package: &PackageDoc) -> GeneratedTable {
    fn collect(package: &PackageDoc, rows: &mut Vec<Vec<String>>) {
        for class in &package.classes {
            rows.push(vec![class.name.clone(), package.name.clone()]);
        }
        for child in &package.packages {
            collect(child, rows);
        }
    }
    let mut rows = Vec::new();
    collect(package, &mut rows);
    GeneratedTable::new(
        format!("Logical nodes of {}", package.name),
        &["Logical node", "Package"],
        rows,
    )
}

/// Attribute names, sorted, with the classes using them.
fn data_index(package: &PackageDoc) -> GeneratedTable {
    let mut index: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for class in package.all_classes() {
        for attr in &class.attributes {
            index.entry(&attr.name).or_default().insert(&class.name);
        }
    }
    let rows = index
        .into_iter()
        .map(|(name, classes)| {
            vec![
                name.to_owned(),
                classes.into_iter().collect::<Vec<_>>().join(", "),
            ]
        })
        .collect();
    GeneratedTable::new(
        format!("Data object names in {}", package.name),
        &["Data object name", "Used in"],
        rows,
    )
}
