#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Violations of the witness shape polywit can validate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("witness does not have a single entry node (found {0})")]
    EntryNodeCount(usize),

    #[error("no support for non-violation witnesses")]
    NoViolationNode,

    #[error("witness does not have a single violation node (found {0})")]
    ViolationNodeCount(usize),

    #[error("no path from the entry node to the violation node")]
    Unreachable,

    #[error("witness has multiple execution paths from source to sink")]
    MultiplePaths,

    #[error("no support for witness type '{0}'")]
    UnsupportedWitnessType(String),

    #[error("no support for source language '{0}'")]
    UnsupportedLanguage(String),

    #[error("assumption edge {source_node} -> {target_node} is missing '{key}'")]
    MissingEdgeKey {
        source_node: String,
        target_node: String,
        key: &'static str,
    },

    #[error("assumption edge {source_node} -> {target_node} has non-numeric startline '{value}'")]
    InvalidLine {
        source_node: String,
        target_node: String,
        value: String,
    },
}

#[derive(Debug, Error, Diagnostic)]
pub enum WitnessError {
    #[error("failed to read witness {path}: {source}")]
    #[diagnostic(code(polywit::witness::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed witness {origin}: {source}")]
    #[diagnostic(
        code(polywit::witness::format),
        help("the witness must be a well-formed GraphML document")
    )]
    Xml {
        origin: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("malformed witness {origin}: {message}")]
    #[diagnostic(code(polywit::witness::format))]
    Format { origin: String, message: String },

    #[error("invalid witness {origin}: {source}")]
    #[diagnostic(code(polywit::witness::structure))]
    Structure {
        origin: String,
        #[source]
        source: StructureError,
    },

    #[error("invalid pattern '{name}': {source}")]
    #[diagnostic(code(polywit::witness::pattern))]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

impl WitnessError {
    pub fn format(origin: impl Into<String>, message: impl Into<String>) -> Self {
        WitnessError::Format {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn structure(origin: impl Into<String>, source: StructureError) -> Self {
        WitnessError::Structure {
            origin: origin.into(),
            source,
        }
    }

    /// The file could not be read or is not a well-formed attributed graph.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            WitnessError::Io { .. } | WitnessError::Xml { .. } | WitnessError::Format { .. }
        )
    }

    pub fn structure_error(&self) -> Option<&StructureError> {
        match self {
            WitnessError::Structure { source, .. } => Some(source),
            _ => None,
        }
    }
}
