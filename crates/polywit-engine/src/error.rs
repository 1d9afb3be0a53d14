#![allow(unused_assignments)]

use std::fmt;

use miette::Diagnostic;
use polywit_witness::WitnessError;
use serde::Serialize;
use thiserror::Error;

use crate::frontend::FrontendError;
use crate::harness::HarnessError;
use crate::resolver::ResolveError;
use crate::validator::ValidatorState;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FilePreprocessing,
    WitnessPreprocessing,
    PositionTypeExtraction,
    AssumptionExtraction,
    HarnessConstruction,
    HarnessExecution,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::FilePreprocessing,
        Stage::WitnessPreprocessing,
        Stage::PositionTypeExtraction,
        Stage::AssumptionExtraction,
        Stage::HarnessConstruction,
        Stage::HarnessExecution,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::FilePreprocessing => "file preprocessing",
            Stage::WitnessPreprocessing => "witness preprocessing",
            Stage::PositionTypeExtraction => "position type extraction",
            Stage::AssumptionExtraction => "assumption extraction",
            Stage::HarnessConstruction => "construction of test harness",
            Stage::HarnessExecution => "execution of test harness",
        }
    }

    /// Line shown while the stage runs.
    pub fn progress_message(self) -> &'static str {
        match self {
            Stage::FilePreprocessing => "Preprocessing benchmark files",
            Stage::WitnessPreprocessing => "Checking witness",
            Stage::PositionTypeExtraction => "Resolving nondeterministic inputs",
            Stage::AssumptionExtraction => "Extracting witness assumptions",
            Stage::HarnessConstruction => "Building test harness",
            Stage::HarnessExecution => "Running test harness",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong inside a stage.
#[derive(Debug, Error)]
pub enum ValidationCause {
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    #[error(transparent)]
    Witness(#[from] WitnessError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error("cannot {operation} while the validator is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: ValidatorState,
    },
}

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The benchmark could not be copied or rewritten.
    Preprocessing,
    /// The witness file is unreadable or not a well-formed attributed graph.
    WitnessFormat,
    /// The witness graph does not have the supported shape.
    WitnessStructure,
    ImportResolution,
    Parse,
    HarnessConstruction,
    HarnessExecution,
    InvalidTransition,
}

/// A failure, tagged with the stage it happened in.
#[derive(Debug, Error, Diagnostic)]
#[error("polywit has encountered an issue during {stage}")]
#[diagnostic(
    code(polywit::validation),
    help("retry using --stacktrace to see the full cause")
)]
pub struct ValidationError {
    pub stage: Stage,
    #[source]
    pub cause: ValidationCause,
}

impl ValidationError {
    pub fn new(stage: Stage, cause: impl Into<ValidationCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match &self.cause {
            ValidationCause::Frontend(FrontendError::Parse { .. }) => ErrorKind::Parse,
            ValidationCause::Frontend(_) => ErrorKind::Preprocessing,
            ValidationCause::Witness(e) if e.is_format() => ErrorKind::WitnessFormat,
            ValidationCause::Witness(WitnessError::Pattern { .. }) => ErrorKind::WitnessFormat,
            ValidationCause::Witness(_) => ErrorKind::WitnessStructure,
            ValidationCause::Resolve(ResolveError::Parse(_)) => ErrorKind::Parse,
            ValidationCause::Resolve(_) => ErrorKind::ImportResolution,
            ValidationCause::Harness(e) if e.is_execution() => ErrorKind::HarnessExecution,
            ValidationCause::Harness(_) => ErrorKind::HarnessConstruction,
            ValidationCause::InvalidTransition { .. } => ErrorKind::InvalidTransition,
        }
    }

    /// Every message in the cause chain, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        let mut current: Option<&dyn std::error::Error> = std::error::Error::source(self);
        while let Some(err) = current {
            let message = err.to_string();
            if out.last() != Some(&message) {
                out.push(message);
            }
            current = err.source();
        }
        out
    }
}
