//! Options for one generation run.

use cimdoc_document::{CaptionLabels, DocProperties};

use crate::style::StyleRole;

/// Where the sentence introducing a figure goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FigureIntro {
    /// Intro paragraph, then image, then caption.
    #[default]
    Before,
    /// Image, caption, then intro paragraph.
    After,
}

/// How top-level errors during content writing are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Log the error, save what was written, return the report.
    #[default]
    Lenient,
    /// Save what was written, then return the error.
    Strict,
}

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Expand placeholders into full content. Off means analyze only.
    pub deep_write: bool,
    pub hyperlinks: bool,
    pub figure_intro: FigureIntro,
    /// Tables written between close/reopen cycles; `<= 0` disables.
    pub reopen_threshold: i64,
    pub print_inheritance: bool,
    pub mode: WriteMode,
    pub captions: CaptionLabels,
    /// Candidate style names per role, most preferred first.
    pub styles: Vec<(StyleRole, Vec<String>)>,
    /// Title, subject and author. Comments are filled in by the writer.
    pub properties: DocProperties,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            deep_write: true,
            hyperlinks: true,
            figure_intro: FigureIntro::Before,
            reopen_threshold: 0,
            print_inheritance: true,
            mode: WriteMode::Lenient,
            captions: CaptionLabels::default(),
            styles: Vec::new(),
            properties: DocProperties::default(),
        }
    }
}

impl WriterOptions {
    /// Options for an analyze-only run.
    #[must_use]
    pub fn analyze() -> Self {
        Self {
            deep_write: false,
            ..Self::default()
        }
    }
}
