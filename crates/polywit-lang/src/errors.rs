#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Syntax error in {file}: {message}")]
    #[diagnostic(code(polywit::parse::syntax))]
    Syntax {
        file: String,
        message: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Empty parse result for {file}")]
    #[diagnostic(code(polywit::parse::empty))]
    Empty { file: String },
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, span: Span, source: &str, filename: &str) -> Self {
        ParseError::Syntax {
            file: filename.to_owned(),
            message: message.into(),
            span: (span.start, span.end.saturating_sub(span.start)).into(),
            src: miette::NamedSource::new(filename, source.to_owned()),
        }
    }

    pub(crate) fn from_pest<R: pest::RuleType>(
        err: pest::error::Error<R>,
        source: &str,
        filename: &str,
    ) -> Self {
        let (start, end) = match err.location {
            pest::error::InputLocation::Pos(p) => (p, p + 1),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        let end = end.min(source.len()).max(start);
        ParseError::syntax(err.variant.message(), Span::new(start, end), source, filename)
    }

    pub fn file(&self) -> &str {
        match self {
            ParseError::Syntax { file, .. } | ParseError::Empty { file } => file,
        }
    }
}
