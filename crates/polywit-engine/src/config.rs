//! Validator configuration.

use std::path::PathBuf;

use polywit_lang::SourceLanguage;
use polywit_witness::ScopeFilter;
use serde::{Deserialize, Serialize};

/// External programs used to build and run the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Java compiler.
    pub javac: String,
    /// Java launcher, used for both languages.
    pub java: String,
    /// Kotlin compiler.
    pub kotlinc: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            javac: "javac".into(),
            java: "java".into(),
            kotlinc: "kotlinc".into(),
        }
    }
}

/// Everything a [`Validator`](crate::Validator) needs besides its working
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub language: SourceLanguage,
    /// Directory holding the benchmark sources.
    pub benchmark: PathBuf,
    /// Extra source roots searched for imported classes. Copied into the
    /// working directory alongside the benchmark.
    #[serde(default)]
    pub packages: Vec<PathBuf>,
    /// The violation witness (GraphML).
    pub witness: PathBuf,
    /// Overrides the frontend's default scope filter when set.
    #[serde(default)]
    pub scope_filter: Option<ScopeFilter>,
    /// Directory with replacement driver/oracle templates. Each template is
    /// looked up by the file name of the harness file it produces.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new(SourceLanguage::Java, ".", "witness.graphml")
    }
}

impl ValidatorConfig {
    pub fn new(
        language: SourceLanguage,
        benchmark: impl Into<PathBuf>,
        witness: impl Into<PathBuf>,
    ) -> Self {
        Self {
            language,
            benchmark: benchmark.into(),
            packages: Vec::new(),
            witness: witness.into(),
            scope_filter: None,
            template_dir: None,
            toolchain: ToolchainConfig::default(),
        }
    }

    pub fn with_packages(mut self, packages: Vec<PathBuf>) -> Self {
        self.packages = packages;
        self
    }

    pub fn with_scope_filter(mut self, filter: ScopeFilter) -> Self {
        self.scope_filter = Some(filter);
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    pub fn with_toolchain(mut self, toolchain: ToolchainConfig) -> Self {
        self.toolchain = toolchain;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_path_lookup() {
        let config = ValidatorConfig::new(SourceLanguage::Kotlin, "bench", "w.graphml");
        assert_eq!(config.toolchain.kotlinc, "kotlinc");
        assert_eq!(config.toolchain.java, "java");
        assert!(config.packages.is_empty());
        assert_eq!(config.scope_filter, None);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ValidatorConfig = serde_json::from_str(
            r#"{"language":"java","benchmark":"b","witness":"w.graphml","scope_filter":"strict"}"#,
        )
        .unwrap();
        assert_eq!(config.language, SourceLanguage::Java);
        assert_eq!(config.scope_filter, Some(ScopeFilter::Strict));
        assert_eq!(config.toolchain, ToolchainConfig::default());
    }
}
