use std::path::Path;

use polywit_witness::FilteredAssumptions;
use walkdir::WalkDir;

use super::{escape_quoted, HarnessDefinition, HarnessError, Invocation};
use crate::config::ToolchainConfig;

const DRIVER: &str = include_str!("../../resources/kotlin/Test.kt");
const ORACLE: &str = include_str!("../../resources/kotlin/Verifier.kt");

const JAR: &str = "Test.jar";

/// `Test.kt` plus an `org.polywit.benchmarks.Verifier` object, compiled into
/// a self-contained jar.
#[derive(Debug, Default, Clone, Copy)]
pub struct KotlinHarness;

/// Quotes a value as a Kotlin string literal. `$` would start a template.
fn kotlin_string(value: &str) -> String {
    format!("\"{}\"", escape_quoted(value).replace('$', "\\$"))
}

impl HarnessDefinition for KotlinHarness {
    fn driver_file(&self) -> &'static str {
        "Test.kt"
    }

    fn driver_template(&self) -> &'static str {
        DRIVER
    }

    fn oracle_file(&self) -> &'static str {
        "org/polywit/benchmarks/Verifier.kt"
    }

    fn oracle_template(&self) -> &'static str {
        ORACLE
    }

    fn placeholder(&self) -> &'static str {
        "    var assumptionList = emptyArray<String?>()"
    }

    fn render_assumptions(&self, values: &FilteredAssumptions) -> String {
        let items: Vec<String> = values
            .values()
            .iter()
            .map(|value| value.as_deref().map_or_else(|| "null".to_owned(), kotlin_string))
            .collect();
        format!("    var assumptionList = arrayOf<String?>({})", items.join(", "))
    }

    fn compile_command(
        &self,
        workdir: &Path,
        toolchain: &ToolchainConfig,
    ) -> Result<Invocation, HarnessError> {
        let mut invocation = Invocation::new(&toolchain.kotlinc, workdir);
        for entry in WalkDir::new(workdir).sort_by_file_name() {
            let entry = entry.map_err(|source| HarnessError::Sources {
                path: workdir.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "kt") {
                invocation = invocation.arg(entry.into_path());
            }
        }
        Ok(invocation
            .arg("-include-runtime")
            .arg("-d")
            .arg(workdir.join(JAR)))
    }

    fn run_command(&self, workdir: &Path, toolchain: &ToolchainConfig) -> Invocation {
        Invocation::new(&toolchain.java, workdir)
            .args(["-ea", "-jar"])
            .arg(workdir.join(JAR))
    }
}
