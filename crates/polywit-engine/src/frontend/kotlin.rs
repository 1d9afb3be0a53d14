use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use polywit_lang::{KotlinProvider, ParseTreeProvider, SourceLanguage, Span};
use polywit_witness::ScopeFilter;
use tracing::debug;
use walkdir::WalkDir;

use super::{copy_sources, Frontend, FrontendError};
use crate::harness::{HarnessDefinition, KotlinHarness};

/// Name the benchmark entry point is renamed to, so the driver's own `main`
/// is the only one in the compiled jar.
pub const RENAMED_MAIN: &str = "polywit_main";

const MAIN_PARAMS: &str = "(args: Array<String>)";

#[derive(Debug, Default, Clone, Copy)]
pub struct KotlinFrontend;

impl Frontend for KotlinFrontend {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Kotlin
    }

    fn default_scope_filter(&self) -> ScopeFilter {
        ScopeFilter::Strict
    }

    fn parse_tree_provider(&self) -> &dyn ParseTreeProvider {
        &KotlinProvider
    }

    fn harness(&self) -> &'static dyn HarnessDefinition {
        &KotlinHarness
    }

    fn preprocess(
        &self,
        benchmark: &Path,
        packages: &[PathBuf],
        workdir: &Path,
    ) -> Result<(), FrontendError> {
        copy_sources(benchmark, packages, workdir)?;
        let sources = kotlin_sources(benchmark, packages)?;
        rename_main(workdir, &sources)
    }
}

struct EntryPoint {
    path: PathBuf,
    source: String,
    package: Option<String>,
    name: Span,
    params: Span,
    param_count: usize,
}

/// Kotlin files of the benchmark and package roots, relative to their root.
/// These are the files a copy places in the working directory.
pub fn kotlin_sources(
    benchmark: &Path,
    packages: &[PathBuf],
) -> Result<Vec<PathBuf>, FrontendError> {
    let mut sources = BTreeSet::new();
    for root in std::iter::once(benchmark).chain(packages.iter().map(PathBuf::as_path)) {
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|source| FrontendError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() || !entry.path().extension().is_some_and(|e| e == "kt") {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                sources.insert(relative.to_path_buf());
            }
        }
    }
    Ok(sources.into_iter().collect())
}

/// Renames the single top-level `main` among `sources` (relative to
/// `workdir`) and gives it an `args` parameter when it has none. Other files
/// in `workdir`, such as a driver left by an earlier run, are not searched.
pub fn rename_main(workdir: &Path, sources: &[PathBuf]) -> Result<(), FrontendError> {
    let mut found = Vec::new();
    for relative in sources {
        let path = workdir.join(relative);
        let source = fs::read_to_string(&path).map_err(|source| FrontendError::Rewrite {
            path: path.clone(),
            source,
        })?;
        let tree = KotlinProvider.parse(&source, &path.display().to_string())?;
        let mains: Vec<_> = tree
            .function_declarations()
            .iter()
            .filter(|f| f.is_top_level() && f.name == "main")
            .map(|f| (f.name_span, f.params_span, f.param_count))
            .collect();
        for (name, params, param_count) in mains {
            found.push(EntryPoint {
                path: path.clone(),
                source: source.clone(),
                package: tree.package.clone(),
                name,
                params,
                param_count,
            });
        }
    }

    if found.len() != 1 {
        return Err(FrontendError::EntryPoint { count: found.len() });
    }
    let Some(entry) = found.pop() else {
        return Err(FrontendError::EntryPoint { count: 0 });
    };
    if let Some(package) = entry.package {
        return Err(FrontendError::PackagedEntryPoint {
            path: entry.path,
            package,
        });
    }

    let rewritten = rewrite_entry_point(&entry.source, entry.name, entry.params, entry.param_count);
    debug!(file = %entry.path.display(), "renamed main to {RENAMED_MAIN}");
    fs::write(&entry.path, rewritten).map_err(|source| FrontendError::Rewrite {
        path: entry.path,
        source,
    })
}

/// Replaces the name, and the parameter list when empty. The parameter list
/// follows the name, so it is edited first to keep the name span valid.
fn rewrite_entry_point(source: &str, name: Span, params: Span, param_count: usize) -> String {
    let mut out = source.to_owned();
    if param_count == 0 {
        out.replace_range(params.start..params.end, MAIN_PARAMS);
    }
    out.replace_range(name.start..name.end, RENAMED_MAIN);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_kt() -> Vec<PathBuf> {
        vec![PathBuf::from("Main.kt")]
    }

    #[test]
    fn renames_and_adds_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("Main.kt");
        fs::write(&main, "fun helper() = 1\n\nfun main() {\n    assert(helper() == 2)\n}\n").unwrap();
        rename_main(dir.path(), &main_kt()).unwrap();
        assert_eq!(
            fs::read_to_string(main).unwrap(),
            "fun helper() = 1\n\nfun polywit_main(args: Array<String>) {\n    assert(helper() == 2)\n}\n"
        );
    }

    #[test]
    fn keeps_existing_parameters_and_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("Main.kt");
        let before = "fun main(args: Array<String>) {\n    val x = Verifier.nondetInt()\n}\n";
        fs::write(&main, before).unwrap();
        rename_main(dir.path(), &main_kt()).unwrap();
        let after = fs::read_to_string(main).unwrap();
        assert!(after.starts_with("fun polywit_main(args: Array<String>) {"));
        assert_eq!(after.lines().count(), before.lines().count());
    }

    #[test]
    fn nested_main_is_not_an_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Main.kt"),
            "object App {\n    fun main() {}\n}\n",
        )
        .unwrap();
        let err = rename_main(dir.path(), &main_kt()).unwrap_err();
        assert!(matches!(err, FrontendError::EntryPoint { count: 0 }));
    }

    #[test]
    fn packaged_main_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main.kt"), "package app\n\nfun main() {}\n").unwrap();
        let err = rename_main(dir.path(), &main_kt()).unwrap_err();
        assert!(matches!(err, FrontendError::PackagedEntryPoint { .. }));
    }

    #[test]
    fn driver_left_in_workdir_is_not_an_entry_point() {
        let bench = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        fs::write(bench.path().join("Main.kt"), "fun main() {\n    val x = 1\n}\n").unwrap();
        fs::write(work.path().join("Test.kt"), KotlinHarness.driver_template()).unwrap();

        KotlinFrontend.preprocess(bench.path(), &[], work.path()).unwrap();
        let main = fs::read_to_string(work.path().join("Main.kt")).unwrap();
        assert!(main.starts_with("fun polywit_main(args: Array<String>) {"), "{main}");
        assert_eq!(
            fs::read_to_string(work.path().join("Test.kt")).unwrap(),
            KotlinHarness.driver_template()
        );
    }

    #[test]
    fn sources_are_collected_relative_to_each_root() {
        let bench = tempfile::tempdir().unwrap();
        let pkg = tempfile::tempdir().unwrap();
        fs::write(bench.path().join("Main.kt"), "").unwrap();
        fs::write(bench.path().join("README.md"), "").unwrap();
        fs::create_dir_all(pkg.path().join("org/x")).unwrap();
        fs::write(pkg.path().join("org/x/Util.kt"), "").unwrap();
        let sources = kotlin_sources(bench.path(), &[pkg.path().to_path_buf()]).unwrap();
        assert_eq!(
            sources,
            vec![PathBuf::from("Main.kt"), PathBuf::from("org/x/Util.kt")]
        );
    }
}
