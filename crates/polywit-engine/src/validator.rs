//! The validation state machine.
//!
//! ```text
//! Created --preprocess--> Preprocessed --extract_assumptions--> AssumptionsExtracted
//!     --build_harness--> HarnessBuilt --run_harness--> Completed
//! ```
//!
//! Any failure, including calling an operation out of order, moves the
//! validator to `Failed(stage)`; a failed validator accepts no further
//! operations.

use std::fmt;
use std::path::{Path, PathBuf};

use polywit_witness::{
    align, retained, Assumption, FilteredAssumptions, LinearWitness, NondetSiteMap, ScopeFilter,
    WitnessGraph,
};
use tracing::{debug, info};

use crate::config::ValidatorConfig;
use crate::error::{Stage, ValidationCause, ValidationError};
use crate::frontend::{frontend_for, Frontend};
use crate::harness::{HarnessRunner, HarnessSynthesizer};
use crate::progress::{ProgressObserver, TracingObserver};
use crate::result::{AssumptionRow, AssumptionTable, ValidationReport, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorState {
    Created,
    Preprocessed,
    AssumptionsExtracted,
    HarnessBuilt,
    Completed,
    Failed(Stage),
}

impl fmt::Display for ValidatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidatorState::Created => f.write_str("created"),
            ValidatorState::Preprocessed => f.write_str("preprocessed"),
            ValidatorState::AssumptionsExtracted => f.write_str("assumptions extracted"),
            ValidatorState::HarnessBuilt => f.write_str("harness built"),
            ValidatorState::Completed => f.write_str("completed"),
            ValidatorState::Failed(stage) => write!(f, "failed during {stage}"),
        }
    }
}

/// Input sites, witness assumptions and the aligned values handed to the
/// harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub sites: NondetSiteMap,
    pub assumptions: Vec<Assumption>,
    pub filtered: FilteredAssumptions,
}

impl Extraction {
    pub fn new(sites: NondetSiteMap, assumptions: Vec<Assumption>) -> Self {
        let filtered = align(&sites, &assumptions);
        Self {
            sites,
            assumptions,
            filtered,
        }
    }

    /// Retained assumptions with the type of their site.
    pub fn rows(&self) -> Vec<AssumptionRow> {
        retained(&self.sites, &self.assumptions)
            .map(|assumption| AssumptionRow {
                position: assumption.position.clone(),
                value: assumption.value.clone(),
                value_type: self
                    .sites
                    .get(&assumption.position)
                    .unwrap_or_default()
                    .to_owned(),
            })
            .collect()
    }

    pub fn table(&self) -> AssumptionTable {
        AssumptionTable { rows: self.rows() }
    }
}

pub struct Validator {
    config: ValidatorConfig,
    frontend: Box<dyn Frontend>,
    workdir: PathBuf,
    observer: Box<dyn ProgressObserver>,
    synthesizer: HarnessSynthesizer,
    state: ValidatorState,
    witness: Option<LinearWitness>,
    extraction: Option<Extraction>,
    verdict: Option<Verdict>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("language", &self.frontend.language())
            .field("workdir", &self.workdir)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Validator {
    /// A validator for `config.language`, building the harness in `workdir`.
    pub fn new(config: ValidatorConfig, workdir: impl Into<PathBuf>) -> Self {
        let frontend = frontend_for(config.language);
        Self::with_frontend(config, frontend, workdir)
    }

    pub fn with_frontend(
        config: ValidatorConfig,
        frontend: Box<dyn Frontend>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        let synthesizer = HarnessSynthesizer::new(config.template_dir.clone());
        Self {
            config,
            frontend,
            workdir: workdir.into(),
            observer: Box::new(TracingObserver),
            synthesizer,
            state: ValidatorState::Created,
            witness: None,
            extraction: None,
            verdict: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> ValidatorState {
        self.state
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn scope_filter(&self) -> ScopeFilter {
        self.config
            .scope_filter
            .unwrap_or_else(|| self.frontend.default_scope_filter())
    }

    pub fn producer(&self) -> Option<&str> {
        self.witness.as_ref().and_then(LinearWitness::producer)
    }

    pub fn extraction(&self) -> Option<&Extraction> {
        self.extraction.as_ref()
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// Summary of a completed run.
    pub fn report(&self) -> Option<ValidationReport> {
        let verdict = self.verdict?;
        Some(ValidationReport::new(
            verdict,
            self.frontend.language(),
            self.producer().map(str::to_owned),
            self.extraction.as_ref().map(Extraction::rows).unwrap_or_default(),
        ))
    }

    fn expect_state(
        &mut self,
        expected: ValidatorState,
        operation: &'static str,
        stage: Stage,
    ) -> Result<(), ValidationError> {
        if self.state == expected {
            return Ok(());
        }
        let cause = ValidationCause::InvalidTransition {
            operation,
            state: self.state,
        };
        self.state = ValidatorState::Failed(stage);
        Err(ValidationError::new(stage, cause))
    }

    fn stage<T>(
        &mut self,
        stage: Stage,
        run: impl FnOnce(&mut Self) -> Result<T, ValidationCause>,
    ) -> Result<T, ValidationError> {
        self.observer.start(stage);
        match run(self) {
            Ok(value) => {
                self.observer.succeed(stage);
                Ok(value)
            }
            Err(cause) => {
                self.observer.fail(stage);
                self.state = ValidatorState::Failed(stage);
                Err(ValidationError::new(stage, cause))
            }
        }
    }

    /// Prepares the working directory and checks the witness shape.
    pub fn preprocess(&mut self) -> Result<(), ValidationError> {
        self.expect_state(ValidatorState::Created, "preprocess", Stage::FilePreprocessing)?;

        self.stage(Stage::FilePreprocessing, |v| {
            v.frontend
                .preprocess(&v.config.benchmark, &v.config.packages, &v.workdir)
                .map_err(ValidationCause::from)
        })?;

        let witness = self.stage(Stage::WitnessPreprocessing, |v| {
            let graph = WitnessGraph::load(&v.config.witness)?;
            graph.check_attributes(v.frontend.language())?;
            Ok(graph.into_linear()?)
        })?;
        debug!(
            producer = witness.producer().unwrap_or("unknown"),
            edges = witness.path_edges().count(),
            "witness path"
        );
        self.witness = Some(witness);
        self.state = ValidatorState::Preprocessed;
        Ok(())
    }

    /// Resolves input sites, extracts witness values and aligns them.
    pub fn extract_assumptions(&mut self) -> Result<&Extraction, ValidationError> {
        self.expect_state(
            ValidatorState::Preprocessed,
            "extract assumptions",
            Stage::PositionTypeExtraction,
        )?;

        let sites = self.stage(Stage::PositionTypeExtraction, |v| {
            Ok(v.frontend
                .resolve_nondet_sites(&v.config.benchmark, &v.config.packages)?)
        })?;
        info!(sites = sites.len(), "nondeterministic inputs");

        let filter = self.scope_filter();
        let assumptions = self.stage(Stage::AssumptionExtraction, |v| match &v.witness {
            Some(witness) => Ok(v.frontend.extract_assumptions(witness, filter)?),
            None => Err(ValidationCause::InvalidTransition {
                operation: "extract assumptions",
                state: v.state,
            }),
        })?;

        let extraction = Extraction::new(sites, assumptions);
        info!(
            assumptions = extraction.assumptions.len(),
            retained = extraction.filtered.len(),
            "assumptions aligned"
        );
        self.state = ValidatorState::AssumptionsExtracted;
        Ok(&*self.extraction.insert(extraction))
    }

    /// Writes and compiles the harness.
    pub fn build_harness(&mut self) -> Result<(), ValidationError> {
        self.expect_state(
            ValidatorState::AssumptionsExtracted,
            "build the harness",
            Stage::HarnessConstruction,
        )?;
        self.stage(Stage::HarnessConstruction, |v| {
            let harness = v.frontend.harness();
            let values = v
                .extraction
                .as_ref()
                .map(|e| e.filtered.clone())
                .unwrap_or_default();
            v.synthesizer.synthesize(harness, &v.workdir, &values)?;
            v.synthesizer
                .compile(harness, &v.workdir, &v.config.toolchain)?;
            Ok(())
        })?;
        self.state = ValidatorState::HarnessBuilt;
        Ok(())
    }

    /// Runs the compiled harness and records the verdict.
    pub fn run_harness(&mut self) -> Result<Verdict, ValidationError> {
        self.expect_state(
            ValidatorState::HarnessBuilt,
            "run the harness",
            Stage::HarnessExecution,
        )?;
        let verdict = self.stage(Stage::HarnessExecution, |v| {
            Ok(HarnessRunner.run(v.frontend.harness(), &v.workdir, &v.config.toolchain)?)
        })?;
        info!(%verdict, "validation finished");
        self.verdict = Some(verdict);
        self.state = ValidatorState::Completed;
        Ok(verdict)
    }

    pub fn build_and_run(&mut self) -> Result<Verdict, ValidationError> {
        self.build_harness()?;
        self.run_harness()
    }

    /// Runs every stage in order.
    pub fn validate(&mut self) -> Result<Verdict, ValidationError> {
        self.preprocess()?;
        self.extract_assumptions()?;
        self.build_and_run()
    }
}
