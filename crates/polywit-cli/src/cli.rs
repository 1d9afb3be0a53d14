//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use polywit_witness::ScopeFilter;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Execution-based validator for Java and Kotlin violation witnesses.\n\n\
    The witness values are injected into the benchmark through a generated\n\
    test harness, which is compiled and run:\n  \
    polywit java bench/ --witness witness.graphml --packages common/\n\n\
    Use --show-assumptions to see which witness values reach the program.";

#[derive(Parser)]
#[command(name = "polywit")]
#[command(about = "Execution-based validator for Java and Kotlin violation witnesses")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    /// Log stage details to stderr (same as RUST_LOG=debug)
    #[arg(long, global = true, default_value_t = false)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Validate a witness for a Java benchmark
    Java(ValidateArgs),
    /// Validate a witness for a Kotlin benchmark
    Kotlin(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ValidateArgs {
    /// Directory containing the benchmark sources
    #[arg(value_parser = existing_dir)]
    pub(crate) benchmark: PathBuf,

    /// Violation witness (GraphML)
    #[arg(long, short = 'w')]
    pub(crate) witness: PathBuf,

    /// Additional source roots searched for imports and copied next to the
    /// benchmark
    #[arg(long, short = 'p', num_args = 1.., value_parser = existing_dir)]
    pub(crate) packages: Vec<PathBuf>,

    /// Print the witness values that reach the program
    #[arg(long, default_value_t = false)]
    pub(crate) show_assumptions: bool,

    /// Print the full cause of a failure
    #[arg(long, default_value_t = false)]
    pub(crate) stacktrace: bool,

    /// Which assumption edges count as program inputs (default depends on
    /// the language)
    #[arg(long, value_enum)]
    pub(crate) scope_filter: Option<ScopeFilterArg>,

    /// Build the harness in this directory instead of a temporary one
    #[arg(long)]
    pub(crate) workdir: Option<PathBuf>,

    /// Keep the temporary working directory after the run
    #[arg(long, default_value_t = false)]
    pub(crate) keep_workdir: bool,

    /// Directory with replacement driver/oracle templates
    #[arg(long, value_parser = existing_dir)]
    pub(crate) template_dir: Option<PathBuf>,

    /// Java compiler
    #[arg(long, default_value = "javac")]
    pub(crate) javac: String,

    /// Java launcher
    #[arg(long, default_value = "java")]
    pub(crate) java: String,

    /// Kotlin compiler
    #[arg(long, default_value = "kotlinc")]
    pub(crate) kotlinc: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ScopeFilterArg {
    Lenient,
    Strict,
}

impl From<ScopeFilterArg> for ScopeFilter {
    fn from(arg: ScopeFilterArg) -> Self {
        match arg {
            ScopeFilterArg::Lenient => ScopeFilter::Lenient,
            ScopeFilterArg::Strict => ScopeFilter::Strict,
        }
    }
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("'{value}' is not a directory"))
    }
}
