use std::path::Path;

use polywit_witness::FilteredAssumptions;

use super::{escape_quoted, HarnessDefinition, HarnessError, Invocation};
use crate::config::ToolchainConfig;

const DRIVER: &str = include_str!("../../resources/java/Test.java");
const ORACLE: &str = include_str!("../../resources/java/Verifier.java");

/// `Test.java` plus an `org.sosy_lab.sv_benchmarks.Verifier` oracle,
/// compiled with `javac` and run with assertions enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaHarness;

impl HarnessDefinition for JavaHarness {
    fn driver_file(&self) -> &'static str {
        "Test.java"
    }

    fn driver_template(&self) -> &'static str {
        DRIVER
    }

    fn oracle_file(&self) -> &'static str {
        "org/sosy_lab/sv_benchmarks/Verifier.java"
    }

    fn oracle_template(&self) -> &'static str {
        ORACLE
    }

    fn placeholder(&self) -> &'static str {
        "  static String[] assumptionList = {};"
    }

    fn render_assumptions(&self, values: &FilteredAssumptions) -> String {
        let items: Vec<String> = values
            .values()
            .iter()
            .map(|value| match value {
                Some(v) => format!("\"{}\"", escape_quoted(v)),
                None => "null".to_owned(),
            })
            .collect();
        format!("  static String[] assumptionList = {{{}}};", items.join(", "))
    }

    fn compile_command(
        &self,
        workdir: &Path,
        toolchain: &ToolchainConfig,
    ) -> Result<Invocation, HarnessError> {
        Ok(Invocation::new(&toolchain.javac, workdir)
            .arg("-sourcepath")
            .arg(workdir)
            .arg(workdir.join(self.driver_file())))
    }

    fn run_command(&self, workdir: &Path, toolchain: &ToolchainConfig) -> Invocation {
        Invocation::new(&toolchain.java, workdir)
            .arg("-cp")
            .arg(workdir)
            .args(["-ea", "Test"])
    }
}
