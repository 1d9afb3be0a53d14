#![allow(unused_assignments)]

//! Language frontends.
//!
//! A [`Frontend`] bundles everything language-specific: how the benchmark
//! is prepared in the working directory, which parse-tree provider and
//! import rules locate input sites, which value grammar applies to the
//! witness and which harness is built. The validator picks one frontend at
//! construction and never branches on the language again.

mod java;
mod kotlin;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use polywit_lang::{ParseError, ParseTreeProvider, SourceLanguage};
use polywit_witness::{
    extract_assumptions, grammar_for, Assumption, AssumptionValueExtractor, GrammarSpec,
    LinearWitness, NondetSiteMap, ScopeFilter, WitnessError,
};
use thiserror::Error;
use tracing::trace;
use walkdir::WalkDir;

pub use self::java::JavaFrontend;
pub use self::kotlin::{KotlinFrontend, RENAMED_MAIN};
use crate::harness::HarnessDefinition;
use crate::resolver::{ImportRules, NondetSiteResolver, ResolveError};

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("source directory {0} does not exist")]
    MissingSource(PathBuf),

    #[error("failed to copy {from} into {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to rewrite {path}: {source}")]
    Rewrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Parse(Box<ParseError>),

    #[error("expected exactly one top-level main function, found {count}")]
    EntryPoint { count: usize },

    #[error("main function in {path} must be declared in the default package (found package {package})")]
    PackagedEntryPoint { path: PathBuf, package: String },
}

impl From<ParseError> for FrontendError {
    fn from(err: ParseError) -> Self {
        FrontendError::Parse(Box::new(err))
    }
}

pub trait Frontend {
    fn language(&self) -> SourceLanguage;

    fn default_scope_filter(&self) -> ScopeFilter;

    fn parse_tree_provider(&self) -> &dyn ParseTreeProvider;

    fn import_rules(&self) -> ImportRules {
        ImportRules::for_language(self.language())
    }

    fn harness(&self) -> &'static dyn HarnessDefinition;

    /// Copies the benchmark and package trees into `workdir` and applies any
    /// source rewriting the harness needs.
    fn preprocess(
        &self,
        benchmark: &Path,
        packages: &[PathBuf],
        workdir: &Path,
    ) -> Result<(), FrontendError>;

    fn resolve_nondet_sites(
        &self,
        benchmark: &Path,
        packages: &[PathBuf],
    ) -> Result<NondetSiteMap, ResolveError> {
        NondetSiteResolver::new(
            self.parse_tree_provider(),
            self.import_rules(),
            benchmark,
            packages,
        )
        .resolve()
    }

    fn assumption_grammar(&self, producer: Option<&str>) -> &'static GrammarSpec {
        grammar_for(self.language(), producer)
    }

    fn extract_assumptions(
        &self,
        witness: &LinearWitness,
        filter: ScopeFilter,
    ) -> Result<Vec<Assumption>, WitnessError> {
        let extractor = AssumptionValueExtractor::new(self.assumption_grammar(witness.producer()))?;
        extract_assumptions(witness, &extractor, filter)
    }
}

pub fn frontend_for(language: SourceLanguage) -> Box<dyn Frontend> {
    match language {
        SourceLanguage::Java => Box::new(JavaFrontend),
        SourceLanguage::Kotlin => Box::new(KotlinFrontend),
    }
}

/// Merges the contents of `from` into `to`, overwriting existing files.
pub fn copy_tree(from: &Path, to: &Path) -> Result<(), FrontendError> {
    if !from.is_dir() {
        return Err(FrontendError::MissingSource(from.to_path_buf()));
    }
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|source| FrontendError::Walk {
            path: from.to_path_buf(),
            source,
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        let copied = if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
        } else {
            trace!(file = %entry.path().display(), "copy");
            fs::copy(entry.path(), &target).map(|_| ())
        };
        copied.map_err(|source| FrontendError::Copy {
            from: entry.path().to_path_buf(),
            to: target,
            source,
        })?;
    }
    Ok(())
}

/// Copies the benchmark, then every package root, into `workdir`.
pub fn copy_sources(
    benchmark: &Path,
    packages: &[PathBuf],
    workdir: &Path,
) -> Result<(), FrontendError> {
    copy_tree(benchmark, workdir)?;
    for package in packages {
        copy_tree(package, workdir)?;
    }
    Ok(())
}
