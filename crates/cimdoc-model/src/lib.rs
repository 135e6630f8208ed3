//! Documentation model for cimdoc.
//!
//! The generation engine resolves placeholders against a read-only model:
//! packages, classes with their attributes, association ends and operations,
//! diagrams, and IEC 61850 namespace names. [`ModelFinder`] is the query
//! interface; [`DocModel`] is the in-memory implementation loaded from a
//! YAML or JSON export.
//!
//! # Example
//!
//! ```
//! use cimdoc_model::{DocModel, ModelFinder};
//!
//! let yaml = r#"
//! file: cim.eap
//! packages:
//!   - name: Core
//!     classes:
//!       - name: Version
//!         attributes:
//!           - name: date
//!             type: Date
//!             value: "2024-01-01"
//! "#;
//! let model = DocModel::from_yaml(yaml).unwrap();
//! assert_eq!(model.file_name(), "cim.eap");
//! assert_eq!(
//!     model.find_attribute_value("Core.Version", "date").as_deref(),
//!     Some("2024-01-01")
//! );
//! ```

mod bookmark;
mod doc;
mod error;
mod finder;
mod model;

pub use bookmark::{MAX_BOOKMARK_LEN, bookmark_id};
pub use doc::{ClassDoc, DiagramDoc, PackageDoc, PropertiesDoc};
pub use error::ModelError;
pub use finder::ModelFinder;
pub use model::DocModel;
