use std::path::{Path, PathBuf};

use polywit_lang::{JavaProvider, ParseTreeProvider, SourceLanguage};
use polywit_witness::ScopeFilter;

use super::{copy_sources, Frontend, FrontendError};
use crate::harness::{HarnessDefinition, JavaHarness};

/// Java benchmarks run unmodified: the driver calls `Main.main` directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaFrontend;

impl Frontend for JavaFrontend {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Java
    }

    fn default_scope_filter(&self) -> ScopeFilter {
        ScopeFilter::Lenient
    }

    fn parse_tree_provider(&self) -> &dyn ParseTreeProvider {
        &JavaProvider
    }

    fn harness(&self) -> &'static dyn HarnessDefinition {
        &JavaHarness
    }

    fn preprocess(
        &self,
        benchmark: &Path,
        packages: &[PathBuf],
        workdir: &Path,
    ) -> Result<(), FrontendError> {
        copy_sources(benchmark, packages, workdir)
    }
}
