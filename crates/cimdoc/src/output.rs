//! Colored terminal output for run progress and reports.

use cimdoc_writer::WriteReport;
use console::{Style, Term};

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    fn separator(&self) {
        let _ = self.term.write_line(&"=".repeat(60));
    }

    /// Print the end-of-run summary. Content counts are left out for
    /// analyze runs, which write none.
    pub(crate) fn report(&self, report: &WriteReport, deep_write: bool) {
        self.separator();
        self.highlight(if deep_write {
            "Generation report"
        } else {
            "Analysis report"
        });
        self.info(&format!("Placeholders: {}", report.placeholders));
        if deep_write {
            self.info(&format!("Figures added: {}", report.figures_added));
            self.info(&format!("Tables added: {}", report.tables_added));
            self.info(&format!(
                "Hyperlinks: {} linked, {} plain",
                report.hyperlinks, report.plain_links
            ));
            if report.reopens > 0 {
                self.info(&format!("Document reopened {} times", report.reopens));
            }
        }
        if !report.is_clean() {
            self.warning(&format!(
                "{} placeholders not replaced:",
                report.failures.len()
            ));
            for failure in &report.failures {
                self.warning(&format!("  {failure}"));
            }
        }
        self.separator();
    }
}
