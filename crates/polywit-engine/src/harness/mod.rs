#![allow(unused_assignments)]

//! Test harness synthesis and execution.
//!
//! A harness is two files written into the working directory: a driver that
//! calls the benchmark entry point and prints the spurious marker if it
//! returns, and an oracle that replaces the benchmark's input provider and
//! hands out the witness values in order. The oracle template carries a
//! single placeholder line that is replaced by the value array.

mod java;
mod kotlin;

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use polywit_witness::FilteredAssumptions;
use thiserror::Error;
use tracing::{debug, info};

pub use self::java::JavaHarness;
pub use self::kotlin::KotlinHarness;
use crate::config::ToolchainConfig;
use crate::result::Verdict;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("template {path} could not be read: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template {template} has no placeholder line '{placeholder}'")]
    MissingPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list harness sources in {path}: {source}")]
    Sources {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("harness compilation failed ({status})\n{stderr}")]
    Compile { status: String, stderr: String },

    #[error("failed to run test harness '{program}': {source}")]
    Execution {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    pub fn is_execution(&self) -> bool {
        matches!(self, HarnessError::Execution { .. })
    }
}

/// One external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

/// Language-specific harness layout and toolchain commands.
pub trait HarnessDefinition {
    /// Driver path relative to the working directory.
    fn driver_file(&self) -> &'static str;
    fn driver_template(&self) -> &'static str;
    /// Oracle path relative to the working directory.
    fn oracle_file(&self) -> &'static str;
    fn oracle_template(&self) -> &'static str;
    /// The exact oracle line replaced by the assumption values.
    fn placeholder(&self) -> &'static str;
    /// The line that replaces [`placeholder`](Self::placeholder).
    fn render_assumptions(&self, values: &FilteredAssumptions) -> String;
    fn compile_command(
        &self,
        workdir: &Path,
        toolchain: &ToolchainConfig,
    ) -> Result<Invocation, HarnessError>;
    fn run_command(&self, workdir: &Path, toolchain: &ToolchainConfig) -> Invocation;
    /// Printed when the entry point fails an assertion.
    fn correct_marker(&self) -> &'static str {
        "Exception in thread \"main\" java.lang.AssertionError"
    }
    /// Printed by the driver when the entry point returns normally.
    fn spurious_marker(&self) -> &'static str {
        "polywit: Witness Spurious"
    }
}

/// Body of a double-quoted string literal whose runtime value is `value`.
/// Java and Kotlin share the `\\` and `\"` escapes.
fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out
}

/// Replaces the line equal to `placeholder` (ignoring a trailing `\r`).
pub fn substitute(
    template_name: &str,
    template: &str,
    placeholder: &str,
    replacement: &str,
) -> Result<String, HarnessError> {
    let mut found = false;
    let mut out = String::with_capacity(template.len() + replacement.len());
    for line in template.split_inclusive('\n') {
        let body = line.trim_end_matches('\n').trim_end_matches('\r');
        if !found && body == placeholder {
            out.push_str(replacement);
            out.push_str(&line[body.len()..]);
            found = true;
        } else {
            out.push_str(line);
        }
    }
    if !found {
        return Err(HarnessError::MissingPlaceholder {
            template: template_name.to_owned(),
            placeholder: placeholder.to_owned(),
        });
    }
    Ok(out)
}

/// Writes driver and oracle, then compiles them.
#[derive(Debug, Clone, Default)]
pub struct HarnessSynthesizer {
    template_dir: Option<PathBuf>,
}

impl HarnessSynthesizer {
    pub fn new(template_dir: Option<PathBuf>) -> Self {
        Self { template_dir }
    }

    fn template(&self, file: &str, bundled: &'static str) -> Result<String, HarnessError> {
        let Some(dir) = &self.template_dir else {
            return Ok(bundled.to_owned());
        };
        let name = Path::new(file).file_name().unwrap_or_default();
        let path = dir.join(name);
        fs::read_to_string(&path).map_err(|source| HarnessError::Template { path, source })
    }

    /// Writes both harness files; returns their paths (driver, oracle).
    pub fn synthesize(
        &self,
        harness: &dyn HarnessDefinition,
        workdir: &Path,
        values: &FilteredAssumptions,
    ) -> Result<(PathBuf, PathBuf), HarnessError> {
        let driver = self.template(harness.driver_file(), harness.driver_template())?;
        let oracle = self.template(harness.oracle_file(), harness.oracle_template())?;
        let oracle = substitute(
            harness.oracle_file(),
            &oracle,
            harness.placeholder(),
            &harness.render_assumptions(values),
        )?;

        let driver_path = workdir.join(harness.driver_file());
        let oracle_path = workdir.join(harness.oracle_file());
        write_file(&driver_path, &driver)?;
        write_file(&oracle_path, &oracle)?;
        debug!(
            driver = %driver_path.display(),
            oracle = %oracle_path.display(),
            values = values.len(),
            "harness written"
        );
        Ok((driver_path, oracle_path))
    }

    pub fn compile(
        &self,
        harness: &dyn HarnessDefinition,
        workdir: &Path,
        toolchain: &ToolchainConfig,
    ) -> Result<(), HarnessError> {
        let invocation = harness.compile_command(workdir, toolchain)?;
        info!(command = %invocation, "compiling harness");
        let output = HarnessRunner::execute(&invocation).map_err(|source| HarnessError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        if !output.success {
            return Err(HarnessError::Compile {
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), HarnessError> {
    let result = match path.parent() {
        Some(parent) => fs::create_dir_all(parent).and_then(|()| fs::write(path, contents)),
        None => fs::write(path, contents),
    };
    result.map_err(|source| HarnessError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs the compiled harness and classifies what it printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarnessRunner;

impl HarnessRunner {
    pub fn execute(invocation: &Invocation) -> io::Result<ProcessOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .output()?;
        Ok(ProcessOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    pub fn run(
        &self,
        harness: &dyn HarnessDefinition,
        workdir: &Path,
        toolchain: &ToolchainConfig,
    ) -> Result<Verdict, HarnessError> {
        let invocation = harness.run_command(workdir, toolchain);
        info!(command = %invocation, "running harness");
        let output = Self::execute(&invocation).map_err(|source| HarnessError::Execution {
            program: invocation.program.clone(),
            source,
        })?;
        debug!(status = %output.status, stdout = %output.stdout, stderr = %output.stderr, "harness finished");
        Ok(classify(
            &output.stdout,
            &output.stderr,
            harness.correct_marker(),
            harness.spurious_marker(),
        ))
    }
}

/// Looks for the markers in stderr when it is non-empty, otherwise in
/// stdout. The correct marker takes precedence.
pub fn classify(stdout: &str, stderr: &str, correct: &str, spurious: &str) -> Verdict {
    let output = if stderr.is_empty() { stdout } else { stderr };
    if output.contains(correct) {
        Verdict::Correct
    } else if output.contains(spurious) {
        Verdict::Spurious
    } else {
        Verdict::Unknown
    }
}

pub fn harness_for(language: polywit_lang::SourceLanguage) -> &'static dyn HarnessDefinition {
    match language {
        polywit_lang::SourceLanguage::Java => &JavaHarness,
        polywit_lang::SourceLanguage::Kotlin => &KotlinHarness,
    }
}
