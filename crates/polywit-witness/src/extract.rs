//! Assumption value grammars.
//!
//! Producers describe an input value as a statement (`x = 5;`,
//! `s.equals("abc")`, `d = Double.NaN;`). A grammar is an ordered list of
//! candidate patterns; the first candidate that matches decides the value and
//! the last participating capture group of that match is taken.

use polywit_lang::SourceLanguage;
use regex::Regex;
use tracing::debug;

use crate::errors::WitnessError;
use crate::graph::{LinearWitness, ScopeFilter};
use crate::model::Assumption;

/// How an extracted `null` is handed to the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullLiteral {
    /// `null` becomes the language's null value.
    Absent,
    /// `null` is kept as the string `"null"`.
    Verbatim,
}

/// A named, ordered list of candidate patterns.
#[derive(Debug, Clone, Copy)]
pub struct GrammarSpec {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
    pub null_literal: NullLiteral,
}

pub const PRODUCER_GDART: &str = "GDart";

pub const JAVA_DEFAULT: GrammarSpec = GrammarSpec {
    name: "java-default",
    candidates: &[
        r#"=\s?(\S+)|\w+\.equals\("(.*)"\)|(-?\d*\.?\d+[L]?)|(false|true|null)"#,
        // Value returned straight from a call expression: no assignment.
        r#"\s?(\S+)|\w+\.equals\("(.*)"\)|(-?\d*\.?\d+[L]?)|(false|true|null)"#,
    ],
    null_literal: NullLiteral::Absent,
};

pub const JAVA_GDART: GrammarSpec = GrammarSpec {
    name: "java-gdart",
    candidates: &[
        r#"=\s?(-?\d*\.?\d+|false|true)|\w+\.equals\("(.*)"\)|\w+\.parseDouble\("(.*)"\)|\w+\.parseFloat\("(.*)"\)"#,
        r#"\s?(-?\d*\.?\d+|false|true)|\w+\.equals\("(.*)"\)|\w+\.parseDouble\("(.*)"\)|\w+\.parseFloat\("(.*)"\)"#,
    ],
    null_literal: NullLiteral::Verbatim,
};

pub const KOTLIN_DEFAULT: GrammarSpec = GrammarSpec {
    name: "kotlin-default",
    candidates: &[
        r#"= ((-?\d*\.?\d+[L]?)|(\S+)|(false|true|null))"#,
        r#"((-?\d*\.?\d+[L]?)|(\S+)|(false|true|null))"#,
    ],
    null_literal: NullLiteral::Absent,
};

/// Picks the grammar for a source language and witness producer.
pub fn grammar_for(language: SourceLanguage, producer: Option<&str>) -> &'static GrammarSpec {
    match language {
        SourceLanguage::Java
            if producer.is_some_and(|p| p.trim().eq_ignore_ascii_case(PRODUCER_GDART)) =>
        {
            &JAVA_GDART
        }
        SourceLanguage::Java => &JAVA_DEFAULT,
        SourceLanguage::Kotlin => &KOTLIN_DEFAULT,
    }
}

/// Canonical spellings for floating-point sentinels.
const SENTINELS: &[(&str, &str)] = &[
    ("Double.NaN", "NaN"),
    ("Float.NaN", "NaN"),
    ("Double.POSITIVE_INFINITY", "Infinity"),
    ("Float.POSITIVE_INFINITY", "Infinity"),
    ("Double.NEGATIVE_INFINITY", "-Infinity"),
    ("Float.NEGATIVE_INFINITY", "-Infinity"),
];

#[derive(Debug, Clone)]
pub struct AssumptionValueExtractor {
    spec: &'static GrammarSpec,
    candidates: Vec<Regex>,
}

impl AssumptionValueExtractor {
    pub fn new(spec: &'static GrammarSpec) -> Result<Self, WitnessError> {
        let candidates = spec
            .candidates
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| WitnessError::Pattern {
                    name: spec.name,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { spec, candidates })
    }

    pub fn for_producer(
        language: SourceLanguage,
        producer: Option<&str>,
    ) -> Result<Self, WitnessError> {
        Self::new(grammar_for(language, producer))
    }

    pub fn grammar(&self) -> &'static GrammarSpec {
        self.spec
    }

    /// The literal text of the value, or `None` when no candidate matches.
    pub fn extract(&self, raw: &str) -> Option<String> {
        let value = self.candidates.iter().find_map(|pattern| {
            let captures = pattern.captures(raw)?;
            captures.iter().skip(1).flatten().last().map(|m| m.as_str())
        })?;
        let value = value.strip_suffix(';').unwrap_or(value);
        let value = SENTINELS
            .iter()
            .find(|(sentinel, _)| *sentinel == value)
            .map_or(value, |(_, canonical)| canonical);
        Some(value.to_owned())
    }

    /// The value to inject: `Some(None)` for the null literal, `None` when
    /// nothing matched.
    pub fn assumption_value(&self, raw: &str) -> Option<Option<String>> {
        let value = self.extract(raw)?;
        if value == "null" && self.spec.null_literal == NullLiteral::Absent {
            return Some(None);
        }
        Some(Some(value))
    }
}

/// Extracts values for every assumption edge on the witness path. Edges
/// whose text matches no candidate are dropped.
pub fn extract_assumptions(
    witness: &LinearWitness,
    extractor: &AssumptionValueExtractor,
    filter: ScopeFilter,
) -> Result<Vec<Assumption>, WitnessError> {
    let raw = witness.assumptions_in_path_order(filter)?;
    let mut out = Vec::with_capacity(raw.len());
    for assumption in raw {
        match extractor.assumption_value(&assumption.text) {
            Some(value) => out.push(Assumption::new(assumption.position, value)),
            None => debug!(
                text = %assumption.text,
                position = %assumption.position,
                grammar = extractor.grammar().name,
                "no value in assumption"
            ),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn java() -> AssumptionValueExtractor {
        AssumptionValueExtractor::new(&JAVA_DEFAULT).unwrap()
    }

    fn gdart() -> AssumptionValueExtractor {
        AssumptionValueExtractor::new(&JAVA_GDART).unwrap()
    }

    fn kotlin() -> AssumptionValueExtractor {
        AssumptionValueExtractor::new(&KOTLIN_DEFAULT).unwrap()
    }

    #[test]
    fn assignment_values() {
        let e = java();
        assert_eq!(e.extract("x = 5;").as_deref(), Some("5"));
        assert_eq!(e.extract("x=-12;").as_deref(), Some("-12"));
        assert_eq!(e.extract("flag = true;").as_deref(), Some("true"));
        assert_eq!(e.extract("l = 3000000000L;").as_deref(), Some("3000000000L"));
        assert_eq!(e.extract("f = 0.5;").as_deref(), Some("0.5"));
    }

    #[test]
    fn nan_is_normalized() {
        assert_eq!(java().extract("d = Double.NaN;").as_deref(), Some("NaN"));
        assert_eq!(java().extract("f = Float.NaN;").as_deref(), Some("NaN"));
        assert_eq!(
            java().extract("d = Double.NEGATIVE_INFINITY;").as_deref(),
            Some("-Infinity")
        );
    }

    #[test]
    fn string_equality_idiom() {
        assert_eq!(java().extract("s.equals(\"hello\")").as_deref(), Some("hello"));
        assert_eq!(java().extract("s.equals(\"\")").as_deref(), Some(""));
        assert_eq!(gdart().extract("arg.equals(\"a b\")").as_deref(), Some("a b"));
    }

    #[test]
    fn fallback_without_assignment() {
        assert_eq!(java().extract("42").as_deref(), Some("42"));
        assert_eq!(gdart().extract("7").as_deref(), Some("7"));
        assert_eq!(kotlin().extract("-3").as_deref(), Some("-3"));
    }

    #[test]
    fn null_handling_depends_on_grammar() {
        assert_eq!(java().assumption_value("s = null;"), Some(None));
        assert_eq!(kotlin().assumption_value("s = null"), Some(None));
        assert_eq!(
            java().assumption_value("x = 1;"),
            Some(Some("1".to_string()))
        );
    }

    #[test]
    fn gdart_parse_idioms() {
        let e = gdart();
        assert_eq!(e.extract("d = Double.parseDouble(\"1.5\")").as_deref(), Some("1.5"));
        assert_eq!(e.extract("Float.parseFloat(\"2.25\")").as_deref(), Some("2.25"));
        assert_eq!(e.extract("b = false").as_deref(), Some("false"));
    }

    #[test]
    fn kotlin_assignment() {
        let e = kotlin();
        assert_eq!(e.extract("x = 5").as_deref(), Some("5"));
        assert_eq!(e.extract("x = 5L").as_deref(), Some("5L"));
        assert_eq!(e.extract("b = true").as_deref(), Some("true"));
        assert_eq!(e.extract("d = Double.NaN").as_deref(), Some("NaN"));
    }

    #[test]
    fn unmatched_text_yields_none() {
        assert_eq!(gdart().extract(""), None);
        assert_eq!(java().extract("   "), None);
        assert_eq!(kotlin().extract(""), None);
    }

    #[test]
    fn grammar_selection_by_producer() {
        assert_eq!(grammar_for(SourceLanguage::Java, Some("GDart")).name, "java-gdart");
        assert_eq!(grammar_for(SourceLanguage::Java, Some("gdart ")).name, "java-gdart");
        assert_eq!(grammar_for(SourceLanguage::Java, Some("JBMC")).name, "java-default");
        assert_eq!(grammar_for(SourceLanguage::Java, None).name, "java-default");
        assert_eq!(grammar_for(SourceLanguage::Kotlin, Some("GDart")).name, "kotlin-default");
    }

    #[test]
    fn all_grammars_compile() {
        for spec in [&JAVA_DEFAULT, &JAVA_GDART, &KOTLIN_DEFAULT] {
            assert!(AssumptionValueExtractor::new(spec).is_ok(), "{}", spec.name);
        }
    }
}
