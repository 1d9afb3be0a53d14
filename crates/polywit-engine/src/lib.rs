#![doc = include_str!("../README.md")]

//! polywit validation engine.
//!
//! This crate turns a benchmark, its package directories and a violation
//! witness into a verdict: it resolves non-deterministic input sites,
//! extracts and aligns witness assumptions, synthesizes a test harness and
//! classifies the outcome of running it.

pub mod config;
pub mod error;
pub mod frontend;
pub mod harness;
pub mod progress;
pub mod resolver;
pub mod result;
pub mod validator;

pub use config::{ToolchainConfig, ValidatorConfig};
pub use error::{ErrorKind, Stage, ValidationCause, ValidationError};
pub use frontend::{frontend_for, Frontend, FrontendError};
pub use harness::{HarnessDefinition, HarnessError, HarnessRunner, HarnessSynthesizer};
pub use progress::{ProgressObserver, TracingObserver};
pub use resolver::{ImportRules, NondetSiteResolver, ResolveError};
pub use result::{AssumptionRow, AssumptionTable, ValidationReport, Verdict};
pub use validator::{Extraction, Validator, ValidatorState};
