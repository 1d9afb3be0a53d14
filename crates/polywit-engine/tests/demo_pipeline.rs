//! Runs the validator over the benchmarks shipped under `demos/`.
//!
//! The tests that compile and execute a harness need a JDK (and `kotlinc`
//! for Kotlin) on `PATH` and are ignored by default:
//! `cargo test -p polywit-engine -- --ignored`.

use std::path::{Path, PathBuf};

use polywit_engine::frontend_for;
use polywit_engine::{
    ErrorKind, Stage, Validator, ValidatorConfig, ValidatorState, Verdict,
};
use polywit_lang::SourceLanguage;
use polywit_witness::{NondetSiteMap, Position};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn demo(path: &str) -> PathBuf {
    workspace_root().join("demos").join(path)
}

fn sites(language: SourceLanguage, benchmark: &Path, packages: &[PathBuf]) -> NondetSiteMap {
    frontend_for(language)
        .resolve_nondet_sites(benchmark, packages)
        .unwrap_or_else(|e| panic!("resolve {}: {e}", benchmark.display()))
}

fn java_config(benchmark: &str, witness: &str) -> ValidatorConfig {
    ValidatorConfig::new(SourceLanguage::Java, demo(benchmark), demo(witness))
        .with_packages(vec![demo("java/common")])
}

#[test]
fn wrapper_sites_include_propagated_call() {
    let map = sites(SourceLanguage::Java, &demo("java/wrapper"), &[]);
    let got: Vec<_> = map.iter().map(|(p, t)| (p.to_string(), t.to_owned())).collect();
    assert_eq!(
        got,
        vec![
            ("Main:5".to_string(), "int".to_string()),
            ("Main:10".to_string(), "boolean".to_string()),
            ("Main:11".to_string(), "string".to_string()),
            ("Main:9".to_string(), "int".to_string()),
        ]
    );
}

#[test]
fn imports_follow_benchmark_and_package_roots() {
    let map = sites(
        SourceLanguage::Java,
        &demo("java/imports"),
        &[demo("java/lib")],
    );
    assert_eq!(map.get(&Position::new("Main", 7)), Some("int"));
    assert_eq!(map.get(&Position::new("Main", 8)), Some("double"));
    assert_eq!(map.get(&Position::new("Input", 7)), Some("int"));
    assert_eq!(map.get(&Position::new("Box", 17)), Some("long"));
    assert_eq!(map.len(), 4);
}

#[test]
fn imports_without_package_root_fail() {
    let err = frontend_for(SourceLanguage::Java)
        .resolve_nondet_sites(&demo("java/imports"), &[])
        .unwrap_err();
    assert!(err.to_string().contains("shapes"), "{err}");
}

#[test]
fn kotlin_sites() {
    let map = sites(SourceLanguage::Kotlin, &demo("kotlin/assert_int"), &[]);
    assert_eq!(map.get(&Position::new("Main", 4)), Some("int"));
    assert_eq!(map.len(), 1);
}

#[test]
fn wrapper_demo_aligns_values_in_call_order() {
    let work = tempfile::tempdir().unwrap();
    let mut validator = Validator::new(
        java_config("java/wrapper", "java/wrapper/witness.graphml"),
        work.path(),
    );
    validator.preprocess().unwrap();
    let extraction = validator.extract_assumptions().unwrap();
    assert_eq!(
        extraction.filtered.values(),
        &[
            Some("11".to_string()),
            Some("true".to_string()),
            Some("go".to_string())
        ]
    );
    // Package roots are merged into the working directory.
    assert!(work
        .path()
        .join("org/sosy_lab/sv_benchmarks/Verifier.java")
        .is_file());
}

#[test]
fn imports_demo_drops_constructor_assumption() {
    let work = tempfile::tempdir().unwrap();
    let config = java_config("java/imports", "java/imports/witness.graphml")
        .with_packages(vec![demo("java/common"), demo("java/lib")]);
    let mut validator = Validator::new(config, work.path());
    validator.preprocess().unwrap();
    let extraction = validator.extract_assumptions().unwrap();
    assert_eq!(extraction.assumptions.len(), 3);
    assert_eq!(
        extraction.filtered.values(),
        &[Some("3".to_string()), Some("12.5".to_string())]
    );
    let table = extraction.table().to_string();
    assert!(table.contains("Main:8"));
    assert!(table.contains("double"));
}

#[test]
fn branching_witness_fails_witness_preprocessing() {
    let work = tempfile::tempdir().unwrap();
    let mut validator = Validator::new(
        java_config("java/assert_int", "java/assert_int/witness_branching.graphml"),
        work.path(),
    );
    let err = validator.validate().unwrap_err();
    assert_eq!(err.stage, Stage::WitnessPreprocessing);
    assert_eq!(err.kind(), ErrorKind::WitnessStructure);
    assert_eq!(
        validator.state(),
        ValidatorState::Failed(Stage::WitnessPreprocessing)
    );
}

#[test]
fn kotlin_demo_renames_main_and_keeps_scoped_assumption() {
    let work = tempfile::tempdir().unwrap();
    let config = ValidatorConfig::new(
        SourceLanguage::Kotlin,
        demo("kotlin/assert_int"),
        demo("kotlin/assert_int/witness.graphml"),
    )
    .with_packages(vec![demo("kotlin/common")]);
    let mut validator = Validator::new(config, work.path());
    validator.preprocess().unwrap();
    let main = std::fs::read_to_string(work.path().join("Main.kt")).unwrap();
    assert!(main.contains("fun polywit_main(args: Array<String>)"));
    let extraction = validator.extract_assumptions().unwrap();
    assert_eq!(extraction.filtered.values(), &[Some("5".to_string())]);
}

fn run_java(benchmark: &str, witness: &str) -> Verdict {
    let work = tempfile::tempdir().unwrap();
    let mut validator = Validator::new(java_config(benchmark, witness), work.path());
    validator.validate().unwrap_or_else(|e| panic!("{:?}", e.chain()))
}

#[test]
#[ignore = "requires javac and java on PATH"]
fn java_correct_witness() {
    assert_eq!(
        run_java("java/assert_int", "java/assert_int/witness.graphml"),
        Verdict::Correct
    );
}

#[test]
#[ignore = "requires javac and java on PATH"]
fn java_spurious_witness() {
    assert_eq!(
        run_java("java/assert_int", "java/assert_int/witness_spurious.graphml"),
        Verdict::Spurious
    );
}

#[test]
#[ignore = "requires javac and java on PATH"]
fn java_wrapper_witness() {
    assert_eq!(
        run_java("java/wrapper", "java/wrapper/witness.graphml"),
        Verdict::Correct
    );
}

#[test]
#[ignore = "requires kotlinc and java on PATH"]
fn kotlin_correct_witness() {
    let work = tempfile::tempdir().unwrap();
    let config = ValidatorConfig::new(
        SourceLanguage::Kotlin,
        demo("kotlin/assert_int"),
        demo("kotlin/assert_int/witness.graphml"),
    )
    .with_packages(vec![demo("kotlin/common")]);
    let mut validator = Validator::new(config, work.path());
    assert_eq!(validator.validate().unwrap(), Verdict::Correct);
}
