//! Configuration management for cimdoc.
//!
//! Parses `cimdoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `paths.model`, `paths.template`, `paths.output`
//! - `metadata.title`, `metadata.subject`, `metadata.author`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override template document path.
    pub template: Option<PathBuf>,
    /// Override output document path.
    pub output: Option<PathBuf>,
    /// Override documentation model path.
    pub model: Option<PathBuf>,
    /// Override deep-write mode (false = analyze).
    pub deep_write: Option<bool>,
    /// Override hyperlink generation.
    pub hyperlinks: Option<bool>,
    /// Override close/reopen threshold.
    pub reopen_threshold: Option<i64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "cimdoc.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input and output paths (relative strings from TOML).
    paths: PathsConfigRaw,
    /// Generation options.
    pub writer: WriterConfig,
    /// Prioritized style names per role.
    pub styles: StylesConfig,
    /// Caption labels.
    pub captions: CaptionsConfig,
    /// Document metadata written into the output.
    pub metadata: MetadataConfig,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths_resolved: PathsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw paths as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PathsConfigRaw {
    model: Option<String>,
    template: Option<String>,
    output: Option<String>,
}

/// Resolved paths.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PathsConfig {
    /// Documentation model export (YAML or JSON).
    pub model: PathBuf,
    /// Template document.
    pub template: PathBuf,
    /// Generated document.
    pub output: PathBuf,
}

/// Where the introductory sentence of a figure goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureIntro {
    #[default]
    Before,
    After,
}

/// Generation options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Write full content. `false` only validates and substitutes values.
    pub deep_write: bool,
    /// Turn type references into hyperlinks to class headings.
    pub hyperlinks: bool,
    pub figure_intro: FigureIntro,
    /// Tables written between close/reopen cycles; `<= 0` disables.
    pub reopen_threshold: i64,
    /// Write the inheritance path line under class headings.
    pub print_inheritance: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            deep_write: true,
            hyperlinks: true,
            figure_intro: FigureIntro::Before,
            reopen_threshold: 0,
            print_inheritance: true,
        }
    }
}

/// Style names per role, most preferred first. The last name is the default.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StylesConfig {
    /// Heading style prefixes (`Heading` resolves to `Heading 1`..`Heading 9`).
    pub heading: Vec<String>,
    /// TOC entry style prefixes.
    pub toc: Vec<String>,
    pub paragraph: Vec<String>,
    pub figure: Vec<String>,
    pub table_head: Vec<String>,
    pub table_cell: Vec<String>,
    pub figure_caption: Vec<String>,
    pub table_caption: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        let names = |names: &[&str]| names.iter().map(|&n| n.to_owned()).collect();
        Self {
            heading: names(&["Heading"]),
            toc: names(&["TOC"]),
            paragraph: names(&["Body Text", "Normal"]),
            figure: names(&["Figure", "Normal"]),
            table_head: names(&["TableHeader", "Normal"]),
            table_cell: names(&["TableCell", "Normal"]),
            figure_caption: names(&["Caption"]),
            table_caption: names(&["Caption"]),
        }
    }
}

impl StylesConfig {
    /// All lists with their config field names.
    fn lists(&self) -> [(&'static str, &[String]); 8] {
        [
            ("styles.heading", &self.heading),
            ("styles.toc", &self.toc),
            ("styles.paragraph", &self.paragraph),
            ("styles.figure", &self.figure),
            ("styles.table_head", &self.table_head),
            ("styles.table_cell", &self.table_cell),
            ("styles.figure_caption", &self.figure_caption),
            ("styles.table_caption", &self.table_caption),
        ]
    }
}

/// Caption labels and the aliases templates may use for them.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptionsConfig {
    pub figure_label: String,
    pub table_label: String,
    pub figure_aliases: Vec<String>,
    pub table_aliases: Vec<String>,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            figure_label: "Figure".to_owned(),
            table_label: "Table".to_owned(),
            figure_aliases: Vec::new(),
            table_aliases: Vec::new(),
        }
    }
}

/// Document metadata.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MetadataConfig {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`paths.model`").
        field: String,
        /// Error message (e.g., "${`MODEL_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `cimdoc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(template) = &settings.template {
            self.paths_resolved.template.clone_from(template);
        }
        if let Some(output) = &settings.output {
            self.paths_resolved.output.clone_from(output);
        }
        if let Some(model) = &settings.model {
            self.paths_resolved.model.clone_from(model);
        }
        if let Some(deep_write) = settings.deep_write {
            self.writer.deep_write = deep_write;
        }
        if let Some(hyperlinks) = settings.hyperlinks {
            self.writer.hyperlinks = hyperlinks;
        }
        if let Some(threshold) = settings.reopen_threshold {
            self.writer.reopen_threshold = threshold;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            paths: PathsConfigRaw::default(),
            writer: WriterConfig::default(),
            styles: StylesConfig::default(),
            captions: CaptionsConfig::default(),
            metadata: MetadataConfig::default(),
            paths_resolved: PathsConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_styles()?;
        self.validate_captions()?;
        Ok(())
    }

    /// Every role needs at least one candidate, and no candidate may be blank.
    fn validate_styles(&self) -> Result<(), ConfigError> {
        for (field, names) in self.styles.lists() {
            if names.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{field} must list at least one style"
                )));
            }
            for name in names {
                require_non_empty(name, field)?;
            }
        }
        Ok(())
    }

    fn validate_captions(&self) -> Result<(), ConfigError> {
        let captions = &self.captions;
        require_non_empty(&captions.figure_label, "captions.figure_label")?;
        require_non_empty(&captions.table_label, "captions.table_label")?;

        let figure = std::iter::once(&captions.figure_label).chain(&captions.figure_aliases);
        for label in figure {
            let clash = std::iter::once(&captions.table_label)
                .chain(&captions.table_aliases)
                .any(|t| t.eq_ignore_ascii_case(label));
            if clash {
                return Err(ConfigError::Validation(format!(
                    "caption label '{label}' is used for both figures and tables"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_opt(&mut self.paths.model, "paths.model")?;
        expand::expand_opt(&mut self.paths.template, "paths.template")?;
        expand::expand_opt(&mut self.paths.output, "paths.output")?;

        expand::expand_opt(&mut self.metadata.title, "metadata.title")?;
        expand::expand_opt(&mut self.metadata.subject, "metadata.subject")?;
        expand::expand_opt(&mut self.metadata.author, "metadata.author")?;

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.paths_resolved = PathsConfig {
            model: resolve(self.paths.model.as_deref(), "model.yaml"),
            template: resolve(self.paths.template.as_deref(), "template.xml"),
            output: resolve(self.paths.output.as_deref(), "out/generated.xml"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(
            config.paths_resolved,
            PathsConfig {
                model: PathBuf::from("/test/model.yaml"),
                template: PathBuf::from("/test/template.xml"),
                output: PathBuf::from("/test/out/generated.xml"),
            }
        );
        assert!(config.writer.deep_write);
        assert!(config.writer.hyperlinks);
        assert_eq!(config.writer.figure_intro, FigureIntro::Before);
        assert_eq!(config.writer.reopen_threshold, 0);
        assert_eq!(config.captions.figure_label, "Figure");
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.styles, StylesConfig::default());
        assert_eq!(config.metadata, MetadataConfig::default());
    }

    #[test]
    fn test_parse_writer_config() {
        let toml = r#"
[writer]
deep_write = false
hyperlinks = false
figure_intro = "after"
reopen_threshold = 25
print_inheritance = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.writer.deep_write);
        assert!(!config.writer.hyperlinks);
        assert_eq!(config.writer.figure_intro, FigureIntro::After);
        assert_eq!(config.writer.reopen_threshold, 25);
        assert!(!config.writer.print_inheritance);
    }

    #[test]
    fn test_parse_rejects_unknown_figure_intro() {
        let toml = r#"
[writer]
figure_intro = "sideways"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_parse_styles_partial() {
        let toml = r#"
[styles]
heading = ["Titre", "Heading"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.styles.heading,
            vec!["Titre".to_owned(), "Heading".to_owned()]
        );
        assert_eq!(config.styles.toc, vec!["TOC".to_owned()]);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[paths]
model = "exports/cim16.yaml"
template = "/abs/template.xml"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.paths_resolved.model,
            PathBuf::from("/project/exports/cim16.yaml")
        );
        assert_eq!(
            config.paths_resolved.template,
            PathBuf::from("/abs/template.xml")
        );
        assert_eq!(
            config.paths_resolved.output,
            PathBuf::from("/project/out/generated.xml")
        );
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            output: Some(PathBuf::from("/tmp/out.xml")),
            deep_write: Some(false),
            reopen_threshold: Some(3),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.paths_resolved.output, PathBuf::from("/tmp/out.xml"));
        assert_eq!(
            config.paths_resolved.template,
            PathBuf::from("/test/template.xml")
        );
        assert!(!config.writer.deep_write);
        assert!(config.writer.hyperlinks);
        assert_eq!(config.writer.reopen_threshold, 3);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert!(config.writer.deep_write);
        assert_eq!(config.paths_resolved.model, PathBuf::from("/test/model.yaml"));
    }

    #[test]
    fn test_load_from_file_resolves_against_config_dir() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[paths]
template = "templates/cim.xml"

[metadata]
title = "CIM ${CIMDOC_TEST_LOAD_EDITION:-16}"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(
            config.paths_resolved.template,
            temp.path().join("templates/cim.xml")
        );
        assert_eq!(config.metadata.title.as_deref(), Some("CIM 16"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_explicit_missing() {
        let err = Config::load(Some(Path::new("/nonexistent/cimdoc.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_missing_env_var() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[paths]\nmodel = \"${CIMDOC_TEST_NO_SUCH_VAR}\"\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("paths.model"));
    }

    #[test]
    fn test_validate_empty_style_list() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.styles.paragraph.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("styles.paragraph"));
    }

    #[test]
    fn test_validate_blank_style_name() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.styles.table_cell = vec!["TableCell".to_owned(), "  ".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("styles.table_cell"));
    }

    #[test]
    fn test_validate_caption_labels_distinct() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.captions.table_aliases = vec!["figure".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("both figures and tables"));
    }

    #[test]
    fn test_validate_empty_caption_label() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.captions.figure_label = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("captions.figure_label"));
    }
}
