use std::path::PathBuf;

use crate::doc::{ClassDoc, PackageDoc};

/// Read-only lookups the generation engine runs against the model.
///
/// Every lookup returns `None` on a miss; the caller decides how to report
/// it.
pub trait ModelFinder {
    /// Name of the source model file, for the `FILE` placeholder.
    fn file_name(&self) -> &str;

    /// Initial value of `class.attribute`. `class` may be simple or qualified.
    fn find_attribute_value(&self, class: &str, attribute: &str) -> Option<String>;

    /// Full name of an IEC 61850 namespace.
    fn find_iec61850_ns_name(&self, name: &str) -> Option<String>;

    /// Existing image file of a diagram owned by a package or class.
    fn find_diagram_file(&self, owner: &str, diagram: &str) -> Option<PathBuf>;

    /// Note attached to a diagram.
    fn find_diagram_note(&self, owner: &str, diagram: &str) -> Option<String>;

    /// Package documentation by simple or qualified name.
    fn package_doc(&self, name: &str) -> Option<&PackageDoc>;

    /// Class documentation by qualified (or unambiguous simple) name.
    fn class_doc(&self, qualified_name: &str) -> Option<&ClassDoc>;
}
