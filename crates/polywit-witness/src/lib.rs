#![doc = include_str!("../README.md")]

pub mod align;
pub mod errors;
pub mod extract;
pub mod graph;
pub mod model;

pub use align::{align, retained};
pub use errors::{StructureError, WitnessError};
pub use extract::{extract_assumptions, grammar_for, AssumptionValueExtractor, GrammarSpec};
pub use graph::{LinearWitness, RawAssumption, ScopeFilter, WitnessGraph};
pub use model::{file_identifier, Assumption, FilteredAssumptions, NondetSiteMap, Position};
