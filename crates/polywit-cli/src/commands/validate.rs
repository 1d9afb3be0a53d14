//! `polywit java|kotlin`: run one validation.

use std::path::PathBuf;

use miette::IntoDiagnostic;
use polywit_engine::{
    ProgressObserver, ToolchainConfig, TracingObserver, ValidationError, Validator,
    ValidatorConfig,
};
use polywit_lang::SourceLanguage;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::cli::{OutputFormat, ValidateArgs};
use crate::output::{render_table, render_verdict, ConsoleObserver};

/// Where the harness is built and whether it outlives the run.
enum Workdir {
    Given(PathBuf),
    Temporary(TempDir),
}

impl Workdir {
    fn create(args: &ValidateArgs) -> miette::Result<Self> {
        match &args.workdir {
            Some(dir) => {
                std::fs::create_dir_all(dir).into_diagnostic()?;
                Ok(Workdir::Given(dir.clone()))
            }
            None => tempfile::Builder::new()
                .prefix("polywit-")
                .tempdir()
                .into_diagnostic()
                .map(Workdir::Temporary),
        }
    }

    fn path(&self) -> PathBuf {
        match self {
            Workdir::Given(dir) => dir.clone(),
            Workdir::Temporary(dir) => dir.path().to_path_buf(),
        }
    }

    fn finish(self, keep: bool) {
        if let Workdir::Temporary(dir) = self {
            if keep {
                let kept = dir.keep();
                info!(workdir = %kept.display(), "keeping working directory");
            }
        }
    }
}

pub(crate) fn config_from_args(language: SourceLanguage, args: &ValidateArgs) -> ValidatorConfig {
    let mut config = ValidatorConfig::new(language, &args.benchmark, &args.witness)
        .with_packages(args.packages.clone())
        .with_toolchain(ToolchainConfig {
            javac: args.javac.clone(),
            java: args.java.clone(),
            kotlinc: args.kotlinc.clone(),
        });
    if let Some(filter) = args.scope_filter {
        config = config.with_scope_filter(filter.into());
    }
    if let Some(dir) = &args.template_dir {
        config = config.with_template_dir(dir);
    }
    config
}

/// The short stage-tagged message, or the whole diagnostic with
/// `--stacktrace`.
fn report_failure(err: ValidationError, stacktrace: bool) -> miette::Report {
    if stacktrace {
        return miette::Report::new(err);
    }
    miette::miette!(
        code = "polywit::validation",
        help = "retry using --stacktrace to see the full cause",
        "{err}"
    )
}

pub(crate) fn run_validate_command(
    language: SourceLanguage,
    args: ValidateArgs,
) -> miette::Result<()> {
    let config = config_from_args(language, &args);
    debug!(?config, "validator configuration");

    let workdir = Workdir::create(&args)?;
    let observer: Box<dyn ProgressObserver> = match args.format {
        OutputFormat::Text => Box::new(ConsoleObserver),
        OutputFormat::Json => Box::new(TracingObserver),
    };
    let mut validator = Validator::new(config, workdir.path()).with_observer(observer);

    let outcome = run_stages(&mut validator, &args);
    workdir.finish(args.keep_workdir);
    let verdict = outcome.map_err(|err| report_failure(err, args.stacktrace))?;

    match args.format {
        OutputFormat::Text => println!("{}", render_verdict(verdict)),
        OutputFormat::Json => {
            if let Some(report) = validator.report() {
                println!("{}", report.to_json().into_diagnostic()?);
            }
        }
    }
    Ok(())
}

fn run_stages(
    validator: &mut Validator,
    args: &ValidateArgs,
) -> Result<polywit_engine::Verdict, ValidationError> {
    validator.preprocess()?;
    let extraction = validator.extract_assumptions()?;
    if args.show_assumptions && args.format == OutputFormat::Text {
        println!("Assumptions:");
        print!("{}", render_table(&extraction.table()));
    }
    validator.build_and_run()
}
