//! `cimdoc generate` and `cimdoc analyze` command implementation.

use std::path::PathBuf;

use clap::Args;
use cimdoc_config::{CliSettings, Config, FigureIntro as ConfigFigureIntro};
use cimdoc_document::{CaptionLabels, DocProperties, FlatXmlApp};
use cimdoc_model::DocModel;
use cimdoc_writer::{FigureIntro, StyleRole, Writer, WriterOptions};

use crate::error::CliError;
use crate::output::Output;

/// Arguments shared by the generate and analyze commands.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Path to configuration file (default: auto-discover cimdoc.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template document (overrides config).
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Output document (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Documentation model, YAML or JSON (overrides config).
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Write type references as plain text.
    #[arg(long)]
    no_hyperlinks: bool,

    /// Tables written between close/reopen cycles, 0 disables (overrides config).
    #[arg(long, env = "CIMDOC_REOPEN_THRESHOLD")]
    reopen_threshold: Option<i64>,

    /// Enable verbose output (show per-placeholder logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RunArgs {
    /// Run one generation. `deep_write` is false for `analyze`.
    pub(crate) fn execute(self, deep_write: bool) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            template: self.template,
            output: self.output,
            model: self.model,
            deep_write: (!deep_write).then_some(false),
            hyperlinks: self.no_hyperlinks.then_some(false),
            reopen_threshold: self.reopen_threshold,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let paths = &config.paths_resolved;

        output.info(&format!("Model: {}", paths.model.display()));
        output.info(&format!("Template: {}", paths.template.display()));
        output.info(&format!("Output: {}", paths.output.display()));

        let model = DocModel::load(&paths.model)?;
        let mut writer = Writer::new(FlatXmlApp::new(), writer_options(&config));
        let report = writer.write(&paths.template, &paths.output, &model)?;

        output.report(&report, config.writer.deep_write);
        output.success(&format!("Document written to {}", paths.output.display()));
        Ok(())
    }
}

/// Writer options from the loaded configuration.
fn writer_options(config: &Config) -> WriterOptions {
    let writer = &config.writer;
    let styles = &config.styles;
    let captions = &config.captions;
    let metadata = &config.metadata;

    WriterOptions {
        deep_write: writer.deep_write,
        hyperlinks: writer.hyperlinks,
        figure_intro: match writer.figure_intro {
            ConfigFigureIntro::Before => FigureIntro::Before,
            ConfigFigureIntro::After => FigureIntro::After,
        },
        reopen_threshold: writer.reopen_threshold,
        print_inheritance: writer.print_inheritance,
        captions: CaptionLabels {
            figure: captions.figure_label.clone(),
            table: captions.table_label.clone(),
            figure_aliases: captions.figure_aliases.clone(),
            table_aliases: captions.table_aliases.clone(),
        },
        styles: vec![
            (StyleRole::Heading, styles.heading.clone()),
            (StyleRole::Toc, styles.toc.clone()),
            (StyleRole::Paragraph, styles.paragraph.clone()),
            (StyleRole::Figure, styles.figure.clone()),
            (StyleRole::TableHead, styles.table_head.clone()),
            (StyleRole::TableCell, styles.table_cell.clone()),
            (StyleRole::FigureCaption, styles.figure_caption.clone()),
            (StyleRole::TableCaption, styles.table_caption.clone()),
        ],
        properties: DocProperties {
            title: metadata.title.clone(),
            subject: metadata.subject.clone(),
            author: metadata.author.clone(),
            comments: None,
        },
        ..WriterOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_writer_options_from_default_config() {
        let options = writer_options(&Config::default());
        assert!(options.deep_write);
        assert!(options.hyperlinks);
        assert_eq!(options.figure_intro, FigureIntro::Before);
        assert_eq!(options.reopen_threshold, 0);
        assert_eq!(options.captions, CaptionLabels::default());
        assert_eq!(options.styles.len(), StyleRole::ALL.len());
        assert_eq!(
            options.styles[2],
            (
                StyleRole::Paragraph,
                vec!["Body Text".to_owned(), "Normal".to_owned()]
            )
        );
    }

    #[test]
    fn test_writer_options_carry_overrides() {
        let mut config = Config::default();
        config.writer.deep_write = false;
        config.writer.figure_intro = ConfigFigureIntro::After;
        config.writer.reopen_threshold = 25;
        config.captions.figure_label = "Abbildung".to_owned();
        config.metadata.title = Some("CIM Profile".to_owned());

        let options = writer_options(&config);
        assert!(!options.deep_write);
        assert_eq!(options.figure_intro, FigureIntro::After);
        assert_eq!(options.reopen_threshold, 25);
        assert_eq!(options.captions.figure, "Abbildung");
        assert_eq!(options.properties.title.as_deref(), Some("CIM Profile"));
        assert_eq!(options.properties.comments, None);
    }
}
