#![doc = include_str!("../README.md")]
//!
//! # Modules
//!
//! - [`ast`]: token tree and the `SyntaxTree` summary handed to callers.
//! - [`errors`]: `ParseError` with `miette` diagnostics.
//! - [`parser`]: pest grammars and the per-language recognisers.

pub mod ast;
pub mod errors;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use ast::{CallSite, FunctionDecl, Import, Span, SyntaxTree};
pub use errors::ParseError;
pub use parser::java::JavaProvider;
pub use parser::kotlin::KotlinProvider;

/// Source languages with a parse-tree provider and a harness definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Java,
    Kotlin,
}

pub const LANGUAGE_JAVA: &str = "java";
pub const LANGUAGE_KOTLIN: &str = "kotlin";

impl SourceLanguage {
    pub const ALL: [SourceLanguage; 2] = [SourceLanguage::Java, SourceLanguage::Kotlin];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceLanguage::Java => LANGUAGE_JAVA,
            SourceLanguage::Kotlin => LANGUAGE_KOTLIN,
        }
    }

    /// Source file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            SourceLanguage::Java => "java",
            SourceLanguage::Kotlin => "kt",
        }
    }

    /// Whether a witness `sourcecodelang` value names this language.
    pub fn matches_witness_tag(self, tag: &str) -> bool {
        tag.trim().eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            LANGUAGE_JAVA => Ok(SourceLanguage::Java),
            LANGUAGE_KOTLIN => Ok(SourceLanguage::Kotlin),
            other => Err(format!(
                "unsupported source language '{other}' (expected one of: {LANGUAGE_JAVA}, {LANGUAGE_KOTLIN})"
            )),
        }
    }
}

/// Produces a [`SyntaxTree`] for one source file of a given language.
pub trait ParseTreeProvider {
    fn language(&self) -> SourceLanguage;

    fn parse(&self, source: &str, filename: &str) -> Result<SyntaxTree, ParseError>;
}

pub fn provider_for(language: SourceLanguage) -> Box<dyn ParseTreeProvider> {
    match language {
        SourceLanguage::Java => Box::new(JavaProvider),
        SourceLanguage::Kotlin => Box::new(KotlinProvider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_str() {
        for language in SourceLanguage::ALL {
            assert_eq!(language.as_str().parse::<SourceLanguage>(), Ok(language));
        }
        assert_eq!("Java".parse::<SourceLanguage>(), Ok(SourceLanguage::Java));
        assert!("c".parse::<SourceLanguage>().is_err());
    }

    #[test]
    fn witness_tag_is_case_insensitive() {
        assert!(SourceLanguage::Java.matches_witness_tag("Java"));
        assert!(SourceLanguage::Kotlin.matches_witness_tag(" KOTLIN "));
        assert!(!SourceLanguage::Java.matches_witness_tag("C"));
    }

    #[test]
    fn provider_matches_language() {
        for language in SourceLanguage::ALL {
            assert_eq!(provider_for(language).language(), language);
        }
    }
}
