#![allow(unused_assignments)]

//! Non-deterministic input site resolution.
//!
//! Starting from every source file of the benchmark, the resolver follows
//! imports into the benchmark tree and the package directories until no new
//! file is reachable, parsing each file once. Sites are then collected in
//! three passes over the parsed files:
//!
//! 1. direct `Verifier.nondetX()` calls,
//! 2. zero-argument functions whose first statement returns one of those
//!    calls (wrappers),
//! 3. calls to a wrapper, which inherit the wrapper's value type.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use polywit_lang::{CallSite, Import, ParseError, ParseTreeProvider, SourceLanguage, SyntaxTree};
use polywit_witness::{file_identifier, NondetSiteMap, Position};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// File stem of the benchmark-side input provider. Never parsed.
pub const PROVIDER_STEM: &str = "Verifier";

const NONDET_PREFIX: &str = "nondet";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("benchmark directory {0} does not exist")]
    MissingBenchmark(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{0}")]
    Parse(Box<ParseError>),

    #[error("no definition found for import '{import}' in {file}")]
    NoDefinition { import: String, file: PathBuf },

    #[error("import '{import}' in {file} is ambiguous: {}", display_paths(.candidates))]
    Ambiguous {
        import: String,
        file: PathBuf,
        candidates: Vec<PathBuf>,
    },
}

impl From<ParseError> for ResolveError {
    fn from(err: ParseError) -> Self {
        ResolveError::Parse(Box::new(err))
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which imports point outside the benchmark and are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportRules {
    /// Dotted prefixes of platform libraries.
    pub ignored_prefixes: &'static [&'static str],
    /// Fully qualified imports of the input provider.
    pub ignored_imports: &'static [&'static str],
    /// An import that names no class file is treated as a member of its
    /// package (Kotlin top-level functions and properties).
    pub members_resolve_to_package: bool,
}

impl ImportRules {
    pub const JAVA: ImportRules = ImportRules {
        ignored_prefixes: &["java.", "javax.", "jdk.", "sun."],
        ignored_imports: &["org.sosy_lab.sv_benchmarks.Verifier"],
        members_resolve_to_package: false,
    };

    pub const KOTLIN: ImportRules = ImportRules {
        ignored_prefixes: &["java.", "javax.", "kotlin.", "kotlinx."],
        ignored_imports: &[
            "org.polywit.benchmarks.Verifier",
            "org.sosy_lab.sv_benchmarks.Verifier",
        ],
        members_resolve_to_package: true,
    };

    pub fn for_language(language: SourceLanguage) -> Self {
        match language {
            SourceLanguage::Java => Self::JAVA,
            SourceLanguage::Kotlin => Self::KOTLIN,
        }
    }

    pub fn is_ignored(&self, import: &Import) -> bool {
        let path = import.path.as_str();
        self.ignored_imports.contains(&path)
            || self
                .ignored_imports
                .iter()
                .any(|i| import.wildcard && i.rsplit_once('.').is_some_and(|(pkg, _)| pkg == path))
            || self.ignored_prefixes.iter().any(|p| path.starts_with(p))
    }
}

/// `Verifier.nondetX()`: the receiver mentions the provider and the name
/// carries a type suffix.
pub fn is_provider_call(call: &CallSite) -> bool {
    call.qualifier
        .as_deref()
        .is_some_and(|q| q.contains(PROVIDER_STEM))
        && call.name.len() > NONDET_PREFIX.len()
        && call.name.starts_with(NONDET_PREFIX)
}

/// `nondetInt` -> `int`.
pub fn value_type(call_name: &str) -> String {
    call_name
        .strip_prefix(NONDET_PREFIX)
        .unwrap_or(call_name)
        .to_lowercase()
}

/// Source files below `dir` with the given extension, sorted by path.
pub fn source_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ResolveError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| ResolveError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|e| e == extension)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

struct ParsedFile {
    identifier: String,
    tree: SyntaxTree,
}

pub struct NondetSiteResolver<'a> {
    provider: &'a dyn ParseTreeProvider,
    rules: ImportRules,
    benchmark: PathBuf,
    packages: Vec<PathBuf>,
}

impl<'a> NondetSiteResolver<'a> {
    pub fn new(
        provider: &'a dyn ParseTreeProvider,
        rules: ImportRules,
        benchmark: &Path,
        packages: &[PathBuf],
    ) -> Self {
        Self {
            provider,
            rules,
            benchmark: benchmark.to_path_buf(),
            packages: packages.to_vec(),
        }
    }

    fn extension(&self) -> &'static str {
        self.provider.language().extension()
    }

    pub fn resolve(&self) -> Result<NondetSiteMap, ResolveError> {
        if !self.benchmark.is_dir() {
            return Err(ResolveError::MissingBenchmark(self.benchmark.clone()));
        }
        let benchmark_files = source_files(&self.benchmark, self.extension())?;

        let mut parsed = Vec::new();
        let mut visited = HashSet::new();
        let mut pending: Vec<PathBuf> = benchmark_files.iter().rev().cloned().collect();
        while let Some(path) = pending.pop() {
            if !visited.insert(path.clone()) {
                continue;
            }
            let identifier = file_identifier(&path.to_string_lossy()).to_owned();
            if identifier == PROVIDER_STEM {
                trace!(file = %path.display(), "skipping input provider");
                continue;
            }
            let source = fs::read_to_string(&path).map_err(|source| ResolveError::Io {
                path: path.clone(),
                source,
            })?;
            let tree = self.provider.parse(&source, &path.display().to_string())?;
            for import in tree.imports() {
                for dependency in self.resolve_import(import, &path, &benchmark_files)? {
                    if !visited.contains(&dependency) {
                        pending.push(dependency);
                    }
                }
            }
            debug!(file = %path.display(), calls = tree.calls.len(), "parsed");
            parsed.push(ParsedFile { identifier, tree });
        }

        Ok(collect_sites(&parsed))
    }

    /// Files an import refers to. Ignored imports resolve to nothing.
    fn resolve_import(
        &self,
        import: &Import,
        from: &Path,
        benchmark_files: &[PathBuf],
    ) -> Result<Vec<PathBuf>, ResolveError> {
        if self.rules.is_ignored(import) {
            return Ok(Vec::new());
        }
        let mut segments: Vec<&str> = import.segments().collect();

        if import.wildcard && !import.is_static {
            return self.resolve_package(import, &segments, from);
        }
        // `import static a.B.member;` needs class `a.B`; `import static a.B.*;`
        // already names it.
        if import.is_static && !import.wildcard {
            segments.pop();
        }
        if let Some(file) = self.resolve_type(import, &segments, from, benchmark_files)? {
            return Ok(vec![file]);
        }
        if self.rules.members_resolve_to_package && segments.len() > 1 {
            segments.pop();
            return self.resolve_package(import, &segments, from);
        }
        Err(ResolveError::NoDefinition {
            import: import.path.clone(),
            file: from.to_path_buf(),
        })
    }

    /// A single type: a benchmark file whose path ends with the import's
    /// components, else exactly one package directory containing it.
    fn resolve_type(
        &self,
        import: &Import,
        segments: &[&str],
        from: &Path,
        benchmark_files: &[PathBuf],
    ) -> Result<Option<PathBuf>, ResolveError> {
        let Some(relative) = relative_file(segments, self.extension()) else {
            return Ok(None);
        };
        let in_benchmark: Vec<PathBuf> = benchmark_files
            .iter()
            .filter(|f| f.ends_with(&relative))
            .cloned()
            .collect();
        let candidates = if in_benchmark.is_empty() {
            self.packages
                .iter()
                .map(|package| package.join(&relative))
                .filter(|p| p.is_file())
                .collect()
        } else {
            in_benchmark
        };
        unique(import, from, candidates)
    }

    /// All files of a package directory, looked up below the benchmark and
    /// each package root, or matching the tail of a package root itself.
    fn resolve_package(
        &self,
        import: &Import,
        segments: &[&str],
        from: &Path,
    ) -> Result<Vec<PathBuf>, ResolveError> {
        let relative: PathBuf = segments.iter().collect();
        let mut dirs: Vec<PathBuf> = Vec::new();
        let roots = std::iter::once(&self.benchmark).chain(self.packages.iter());
        for root in roots {
            let dir = root.join(&relative);
            if dir.is_dir() && !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        for package in &self.packages {
            if package.ends_with(&relative) && !dirs.contains(package) {
                dirs.push(package.clone());
            }
        }
        match unique(import, from, dirs)? {
            Some(dir) => source_files(&dir, self.extension()),
            None => Err(ResolveError::NoDefinition {
                import: import.path.clone(),
                file: from.to_path_buf(),
            }),
        }
    }
}

fn relative_file(segments: &[&str], extension: &str) -> Option<PathBuf> {
    let (last, parents) = segments.split_last()?;
    let mut path: PathBuf = parents.iter().collect();
    path.push(format!("{last}.{extension}"));
    Some(path)
}

fn unique(
    import: &Import,
    from: &Path,
    mut candidates: Vec<PathBuf>,
) -> Result<Option<PathBuf>, ResolveError> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => Err(ResolveError::Ambiguous {
            import: import.path.clone(),
            file: from.to_path_buf(),
            candidates,
        }),
    }
}

fn collect_sites(files: &[ParsedFile]) -> NondetSiteMap {
    let mut sites = NondetSiteMap::new();
    for file in files {
        for call in file.tree.find_calls(is_provider_call) {
            sites.insert(
                Position::new(&file.identifier, call.line),
                value_type(&call.name),
            );
        }
    }

    let mut wrappers: IndexMap<&str, Position> = IndexMap::new();
    for file in files {
        for function in file.tree.function_declarations() {
            if function.param_count != 0 {
                continue;
            }
            let Some(line) = function.first_return_line else {
                continue;
            };
            let position = Position::new(&file.identifier, line);
            if sites.contains(&position) {
                debug!(wrapper = %function.name, site = %position, "wrapper");
                wrappers.insert(function.name.as_str(), position);
            }
        }
    }

    let mut propagated = Vec::new();
    for file in files {
        for call in file.tree.find_calls(|c| wrappers.contains_key(c.name.as_str())) {
            let source = &wrappers[call.name.as_str()];
            if let Some(value_type) = sites.get(source) {
                propagated.push((Position::new(&file.identifier, call.line), value_type.to_owned()));
            }
        }
    }
    for (position, value_type) in propagated {
        sites.insert(position, value_type);
    }
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use polywit_lang::{JavaProvider, KotlinProvider};
    use std::path::Path;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn resolve_java(benchmark: &Path, packages: &[PathBuf]) -> Result<NondetSiteMap, ResolveError> {
        NondetSiteResolver::new(&JavaProvider, ImportRules::JAVA, benchmark, packages).resolve()
    }

    fn import(path: &str, wildcard: bool) -> Import {
        Import {
            path: path.into(),
            wildcard,
            is_static: false,
            alias: None,
            line: 1,
        }
    }

    #[test]
    fn provider_call_recognition() {
        let call = |name: &str, qualifier: Option<&str>| CallSite {
            name: name.into(),
            qualifier: qualifier.map(String::from),
            line: 1,
            span: Default::default(),
        };
        assert!(is_provider_call(&call("nondetInt", Some("Verifier"))));
        assert!(is_provider_call(&call(
            "nondetString",
            Some("org.sosy_lab.sv_benchmarks.Verifier")
        )));
        assert!(!is_provider_call(&call("nondet", Some("Verifier"))));
        assert!(!is_provider_call(&call("nondetInt", None)));
        assert!(!is_provider_call(&call("nondetInt", Some("Random"))));
        assert!(!is_provider_call(&call("assume", Some("Verifier"))));
        assert_eq!(value_type("nondetBoolean"), "boolean");
    }

    #[test]
    fn platform_and_provider_imports_are_ignored() {
        let rules = ImportRules::JAVA;
        assert!(rules.is_ignored(&import("java.util.List", false)));
        assert!(rules.is_ignored(&import("java.util", true)));
        assert!(rules.is_ignored(&import("org.sosy_lab.sv_benchmarks.Verifier", false)));
        assert!(rules.is_ignored(&import("org.sosy_lab.sv_benchmarks", true)));
        assert!(!rules.is_ignored(&import("javafx.scene.Node", false)));
        assert!(ImportRules::KOTLIN.is_ignored(&import("kotlin.math.abs", false)));
    }

    #[test]
    fn single_file_sites() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Main.java",
            "public class Main {\n  public static void main(String[] args) {\n    int x = Verifier.nondetInt();\n    long y = Verifier.nondetLong();\n  }\n}\n",
        );
        let sites = resolve_java(dir.path(), &[]).unwrap();
        assert_eq!(sites.get(&Position::new("Main", 3)), Some("int"));
        assert_eq!(sites.get(&Position::new("Main", 4)), Some("long"));
        assert_eq!(sites.len(), 2);
    }

    #[test]
    fn wrapper_calls_inherit_type() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Main.java",
            "public class Main {\n  static boolean flip() {\n    return Verifier.nondetBoolean();\n  }\n  static int one(int x) {\n    return Verifier.nondetInt();\n  }\n  public static void main(String[] args) {\n    boolean b = flip();\n    int c = one(3);\n  }\n}\n",
        );
        let sites = resolve_java(dir.path(), &[]).unwrap();
        assert_eq!(sites.get(&Position::new("Main", 3)), Some("boolean"));
        assert_eq!(sites.get(&Position::new("Main", 9)), Some("boolean"));
        // Wrappers with parameters are not followed.
        assert_eq!(sites.get(&Position::new("Main", 10)), None);
    }

    #[test]
    fn wrapper_in_imported_file() {
        let dir = tempfile::tempdir().unwrap();
        let packages = dir.path().join("lib");
        write(
            dir.path(),
            "bench/Main.java",
            "import io.Input;\npublic class Main {\n  public static void main(String[] args) {\n    int v = Input.read();\n  }\n}\n",
        );
        write(
            &packages,
            "io/Input.java",
            "package io;\npublic class Input {\n  public static int read() {\n    return Verifier.nondetShort();\n  }\n}\n",
        );
        let sites = resolve_java(&dir.path().join("bench"), &[packages]).unwrap();
        assert_eq!(sites.get(&Position::new("Input", 4)), Some("short"));
        assert_eq!(sites.get(&Position::new("Main", 4)), Some("short"));
    }

    #[test]
    fn unresolvable_import_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Main.java",
            "import missing.Thing;\npublic class Main {}\n",
        );
        let err = resolve_java(dir.path(), &[]).unwrap_err();
        assert!(matches!(err, ResolveError::NoDefinition { ref import, .. } if import == "missing.Thing"));
    }

    #[test]
    fn import_found_in_two_packages_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        write(dir.path(), "bench/Main.java", "import util.Box;\nclass Main {}\n");
        write(&a, "util/Box.java", "package util;\nclass Box {}\n");
        write(&b, "util/Box.java", "package util;\nclass Box {}\n");
        let err = resolve_java(&dir.path().join("bench"), &[a, b]).unwrap_err();
        match err {
            ResolveError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn import_matching_two_benchmark_files_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Main.java", "import util.Box;\nclass Main {}\n");
        write(dir.path(), "left/util/Box.java", "package util;\nclass Box {}\n");
        write(dir.path(), "right/util/Box.java", "package util;\nclass Box {}\n");
        let err = resolve_java(dir.path(), &[]).unwrap_err();
        match err {
            ResolveError::Ambiguous { import, candidates, .. } => {
                assert_eq!(import, "util.Box");
                assert_eq!(candidates.len(), 2);
                assert!(candidates.iter().all(|c| c.ends_with("util/Box.java")));
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn wildcard_found_under_two_roots_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        write(dir.path(), "bench/Main.java", "import shapes.*;\nclass Main {}\n");
        write(&a, "shapes/Circle.java", "package shapes;\nclass Circle {}\n");
        write(&b, "shapes/Square.java", "package shapes;\nclass Square {}\n");
        let err = resolve_java(&dir.path().join("bench"), &[a.clone(), b.clone()]).unwrap_err();
        match err {
            ResolveError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec![a.join("shapes"), b.join("shapes")]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn wildcard_matches_package_root_tail() {
        let dir = tempfile::tempdir().unwrap();
        let shapes = dir.path().join("deps/shapes");
        write(dir.path(), "bench/Main.java", "import shapes.*;\nclass Main {}\n");
        write(
            &shapes,
            "Circle.java",
            "package shapes;\nclass Circle {\n  double r = Verifier.nondetDouble();\n}\n",
        );
        let sites = resolve_java(&dir.path().join("bench"), &[shapes]).unwrap();
        assert_eq!(sites.get(&Position::new("Circle", 3)), Some("double"));
    }

    #[test]
    fn import_cycles_terminate() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        write(dir.path(), "bench/Main.java", "import p.A;\nclass Main {}\n");
        write(&lib, "p/A.java", "package p;\nimport p.B;\nclass A {\n  int a = Verifier.nondetInt();\n}\n");
        write(&lib, "p/B.java", "package p;\nimport p.A;\nclass B {\n  int b = Verifier.nondetByte();\n}\n");
        let sites = resolve_java(&dir.path().join("bench"), &[lib]).unwrap();
        assert_eq!(sites.get(&Position::new("A", 4)), Some("int"));
        assert_eq!(sites.get(&Position::new("B", 4)), Some("byte"));
    }

    #[test]
    fn provider_file_is_not_parsed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Verifier.java", "this is { not java");
        write(dir.path(), "Main.java", "class Main {}\n");
        assert!(resolve_java(dir.path(), &[]).unwrap().is_empty());
    }

    #[test]
    fn kotlin_member_import_resolves_to_package() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        write(
            dir.path(),
            "bench/Main.kt",
            "import util.readValue\n\nfun main() {\n    val v = readValue()\n}\n",
        );
        write(
            &lib,
            "util/Input.kt",
            "package util\n\nfun readValue(): Int = Verifier.nondetInt()\n",
        );
        let sites = NondetSiteResolver::new(
            &KotlinProvider,
            ImportRules::KOTLIN,
            &dir.path().join("bench"),
            &[lib],
        )
        .resolve()
        .unwrap();
        assert_eq!(sites.get(&Position::new("Input", 3)), Some("int"));
        assert_eq!(sites.get(&Position::new("Main", 4)), Some("int"));
    }

    #[test]
    fn missing_benchmark_directory() {
        let err = resolve_java(Path::new("/definitely/not/here"), &[]).unwrap_err();
        assert!(matches!(err, ResolveError::MissingBenchmark(_)));
    }
}
