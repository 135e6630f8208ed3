//! In-memory documentation model loaded from YAML or JSON.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::doc::{ClassDoc, DiagramDoc, PackageDoc};
use crate::error::ModelError;
use crate::finder::ModelFinder;

/// Serialized model layout.
#[derive(Debug, Default, Deserialize)]
struct ModelFile {
    #[serde(default)]
    file: String,
    #[serde(default)]
    namespaces: BTreeMap<String, String>,
    #[serde(default)]
    packages: Vec<PackageDoc>,
}

/// Location of a package in the package tree (child indices from the root).
type PackagePath = Vec<usize>;

/// Documentation model with name indexes.
///
/// Packages and classes are indexed by qualified name and by simple name.
/// When two classes share a simple name, the first one in model order wins
/// the simple-name lookup; the qualified name always resolves.
#[derive(Debug, Default)]
pub struct DocModel {
    file: String,
    base_dir: PathBuf,
    namespaces: BTreeMap<String, String>,
    packages: Vec<PackageDoc>,
    package_index: HashMap<String, PackagePath>,
    class_index: HashMap<String, (PackagePath, usize)>,
    diagram_index: HashMap<(String, String), DiagramDoc>,
}

impl DocModel {
    /// Build a model from top-level packages.
    #[must_use]
    pub fn new(file: impl Into<String>, packages: Vec<PackageDoc>) -> Self {
        Self::from_parts(ModelFile {
            file: file.into(),
            namespaces: BTreeMap::new(),
            packages,
        })
    }

    /// Directory diagram files are resolved against (builder form).
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Register an IEC 61850 namespace (builder form).
    #[must_use]
    pub fn with_namespace(mut self, name: &str, full_name: &str) -> Self {
        self.namespaces
            .insert(name.to_owned(), full_name.to_owned());
        self
    }

    /// Parse a YAML model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Yaml`] for malformed input.
    pub fn from_yaml(content: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_yaml::from_str(content)?;
        Ok(Self::from_parts(file))
    }

    /// Parse a JSON model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] for malformed input.
    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(content)?;
        Ok(Self::from_parts(file))
    }

    /// Load a model file (`.yaml`, `.yml` or `.json`).
    ///
    /// Diagram files resolve relative to the model file's directory. When
    /// the model does not name its source file, the model file's name is
    /// used.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let content = std::fs::read_to_string(path)?;
        let mut model = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => return Err(ModelError::UnsupportedFormat(path.to_path_buf())),
        };
        if model.file.is_empty() {
            model.file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        model.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        tracing::info!(
            path = %path.display(),
            packages = model.package_index.len(),
            classes = model.class_count(),
            "Loaded documentation model"
        );
        Ok(model)
    }

    /// Top-level packages.
    #[must_use]
    pub fn packages(&self) -> &[PackageDoc] {
        &self.packages
    }

    /// Number of classes in the model.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.packages.iter().map(|p| p.all_classes().count()).sum()
    }

    fn from_parts(file: ModelFile) -> Self {
        let mut packages = file.packages;
        for package in &mut packages {
            package.qualify("");
        }

        let mut model = Self {
            file: file.file,
            namespaces: file.namespaces,
            ..Self::default()
        };
        for (i, package) in packages.iter().enumerate() {
            model.index_package(package, vec![i]);
        }

        let bookmarks: HashMap<String, String> = model
            .class_index
            .iter()
            .filter_map(|(name, (path, idx))| {
                let class = package_at(&packages, path)?.classes.get(*idx)?;
                Some((name.clone(), class.bookmark()))
            })
            .collect();
        for package in &mut packages {
            link_types(package, &bookmarks);
        }
        model.packages = packages;
        model
    }

    fn index_package(&mut self, package: &PackageDoc, path: PackagePath) {
        self.package_index
            .insert(package.qualified_name.clone(), path.clone());
        insert_first(
            &mut self.package_index,
            &package.name,
            &package.qualified_name,
            path.clone(),
        );

        for diagram in &package.diagrams {
            self.index_diagram(&package.name, &package.qualified_name, diagram);
        }

        for (idx, class) in package.classes.iter().enumerate() {
            self.class_index
                .insert(class.qualified_name.clone(), (path.clone(), idx));
            insert_first(
                &mut self.class_index,
                &class.name,
                &class.qualified_name,
                (path.clone(), idx),
            );
            for diagram in &class.diagrams {
                self.index_diagram(&class.name, &class.qualified_name, diagram);
            }
        }

        for (i, child) in package.packages.iter().enumerate() {
            let mut child_path = path.clone();
            child_path.push(i);
            self.index_package(child, child_path);
        }
    }

    fn index_diagram(&mut self, name: &str, qualified: &str, diagram: &DiagramDoc) {
        for key in [name, qualified] {
            self.diagram_index
                .entry((key.to_owned(), diagram.name.clone()))
                .or_insert_with(|| diagram.clone());
        }
    }

    fn diagram(&self, owner: &str, diagram: &str) -> Option<&DiagramDoc> {
        self.diagram_index
            .get(&(owner.to_owned(), diagram.to_owned()))
    }
}

/// Insert a simple-name entry unless an earlier one holds the name.
fn insert_first<V>(index: &mut HashMap<String, V>, name: &str, qualified: &str, value: V) {
    if name == qualified {
        return;
    }
    match index.entry(name.to_owned()) {
        Entry::Occupied(_) => {
            tracing::debug!(name = %name, "Ambiguous simple name, keeping first");
        }
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
    }
}

fn package_at<'a>(packages: &'a [PackageDoc], path: &[usize]) -> Option<&'a PackageDoc> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(packages.get(*first)?, |p, i| p.packages.get(*i))
}

/// Fill `type_bookmark` on every property whose type is a documented class.
fn link_types(package: &mut PackageDoc, bookmarks: &HashMap<String, String>) {
    for class in &mut package.classes {
        for property in class
            .attributes
            .iter_mut()
            .chain(class.association_ends.iter_mut())
            .chain(class.operations.iter_mut())
        {
            property.type_bookmark = bookmarks.get(&property.type_name).cloned();
        }
    }
    for child in &mut package.packages {
        link_types(child, bookmarks);
    }
}

impl ModelFinder for DocModel {
    fn file_name(&self) -> &str {
        &self.file
    }

    fn find_attribute_value(&self, class: &str, attribute: &str) -> Option<String> {
        self.class_doc(class)?
            .attributes
            .iter()
            .find(|a| a.name == attribute)?
            .value
            .clone()
    }

    fn find_iec61850_ns_name(&self, name: &str) -> Option<String> {
        self.namespaces.get(name).cloned()
    }

    fn find_diagram_file(&self, owner: &str, diagram: &str) -> Option<PathBuf> {
        let file = self.diagram(owner, diagram)?.file.as_ref()?;
        let path = self.base_dir.join(file);
        if path.is_file() {
            Some(path)
        } else {
            tracing::debug!(path = %path.display(), "Diagram file missing");
            None
        }
    }

    fn find_diagram_note(&self, owner: &str, diagram: &str) -> Option<String> {
        self.diagram(owner, diagram)?
            .note
            .clone()
            .filter(|n| !n.is_empty())
    }

    fn package_doc(&self, name: &str) -> Option<&PackageDoc> {
        package_at(&self.packages, self.package_index.get(name)?)
    }

    fn class_doc(&self, qualified_name: &str) -> Option<&ClassDoc> {
        let (path, idx) = self.class_index.get(qualified_name)?;
        package_at(&self.packages, path)?.classes.get(*idx)
    }
}
