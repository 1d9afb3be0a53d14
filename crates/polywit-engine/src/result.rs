//! Verdicts and reports.

use std::fmt;

use polywit_lang::SourceLanguage;
use polywit_witness::Position;
use serde::Serialize;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Outcome of running the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The witness values drive the program into the assertion failure.
    Correct,
    /// The program ran to completion on the witness values.
    Spurious,
    Unknown,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Correct => "CORRECT",
            Verdict::Spurious => "SPURIOUS",
            Verdict::Unknown => "UNKNOWN",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Verdict::Correct => "Witness correct",
            Verdict::Spurious => "Witness spurious",
            Verdict::Unknown => "Witness could not be validated",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One retained assumption with the type of its input site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssumptionRow {
    pub position: Position,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub value_type: String,
}

/// Plain-text table of retained assumptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssumptionTable {
    pub rows: Vec<AssumptionRow>,
}

impl AssumptionTable {
    const HEADERS: [&'static str; 3] = ["Position", "Value", "Type"];

    fn cells(row: &AssumptionRow) -> [String; 3] {
        [
            row.position.to_string(),
            row.value.clone().unwrap_or_else(|| "null".to_owned()),
            row.value_type.clone(),
        ]
    }
}

impl fmt::Display for AssumptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 3]> = self.rows.iter().map(Self::cells).collect();
        let mut widths = Self::HEADERS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        let [w0, w1, w2] = widths;
        writeln!(
            f,
            "{:<w0$}  {:<w1$}  {:<w2$}",
            Self::HEADERS[0],
            Self::HEADERS[1],
            Self::HEADERS[2]
        )?;
        writeln!(f, "{}  {}  {}", "-".repeat(w0), "-".repeat(w1), "-".repeat(w2))?;
        for [position, value, value_type] in &cells {
            writeln!(f, "{position:<w0$}  {value:<w1$}  {value_type:<w2$}")?;
        }
        Ok(())
    }
}

/// Machine-readable summary of a completed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub schema_version: u32,
    pub verdict: Verdict,
    pub language: SourceLanguage,
    pub producer: Option<String>,
    pub assumptions: Vec<AssumptionRow>,
}

impl ValidationReport {
    pub fn new(
        verdict: Verdict,
        language: SourceLanguage,
        producer: Option<String>,
        assumptions: Vec<AssumptionRow>,
    ) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            verdict,
            language,
            producer,
            assumptions,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
