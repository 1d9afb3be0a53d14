//! Console rendering: stage progress, verdict line and assumption table.

use colored::Colorize;
use polywit_engine::{AssumptionTable, ProgressObserver, Stage, Verdict};

/// Prints one line per stage transition to stderr.
#[derive(Debug, Default)]
pub(crate) struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn start(&mut self, stage: Stage) {
        eprintln!("{} {}", "[..]".dimmed(), stage.progress_message());
    }

    fn succeed(&mut self, stage: Stage) {
        eprintln!("{} {}", "[OK]".green().bold(), stage.progress_message());
    }

    fn fail(&mut self, stage: Stage) {
        eprintln!("{} {}", "[FAIL]".red().bold(), stage.progress_message());
    }
}

pub(crate) fn render_verdict(verdict: Verdict) -> String {
    let message = match verdict {
        Verdict::Correct => verdict.message().green().bold(),
        Verdict::Spurious => verdict.message().red().bold(),
        Verdict::Unknown => verdict.message().yellow().bold(),
    };
    format!("polywit: {message}")
}

pub(crate) fn render_table(table: &AssumptionTable) -> String {
    let mut out = String::new();
    for line in table.to_string().lines() {
        out.push_str("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use polywit_engine::AssumptionRow;
    use polywit_witness::Position;

    #[test]
    fn verdict_line_contains_message() {
        colored::control::set_override(false);
        assert_eq!(render_verdict(Verdict::Spurious), "polywit: Witness spurious");
        assert_eq!(
            render_verdict(Verdict::Unknown),
            "polywit: Witness could not be validated"
        );
    }

    #[test]
    fn table_is_indented() {
        let table = AssumptionTable {
            rows: vec![AssumptionRow {
                position: Position::new("Main", 5),
                value: Some("5".into()),
                value_type: "int".into(),
            }],
        };
        let text = render_table(&table);
        assert!(text.lines().all(|l| l.starts_with("  ")));
        assert!(text.contains("  Main:5"));
    }
}
