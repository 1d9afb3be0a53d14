//! Token-tree construction shared by the per-language grammars.

pub mod java;
pub mod kotlin;

use pest::iterators::Pairs;
use pest::RuleType;

use crate::ast::{Delimiter, Span, TokenTree};

/// Maps byte offsets to 1-based line numbers.
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub(crate) fn line_of(&self, offset: usize) -> u32 {
        let idx = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (idx + 1) as u32
    }
}

/// How a grammar rule maps onto the token tree.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape {
    Group(Delimiter),
    Word,
    Literal,
    Symbol,
}

pub(crate) fn build_tokens<R, F>(pairs: Pairs<'_, R>, shape: &F, lines: &LineIndex) -> Vec<TokenTree>
where
    R: RuleType,
    F: Fn(R) -> Option<Shape>,
{
    pairs
        .filter_map(|pair| {
            let raw = pair.as_span();
            let span = Span::new(raw.start(), raw.end());
            let line = lines.line_of(raw.start());
            let token = match shape(pair.as_rule())? {
                Shape::Group(delimiter) => TokenTree::Group {
                    delimiter,
                    children: build_tokens(pair.into_inner(), shape, lines),
                    span,
                    line,
                },
                Shape::Word => TokenTree::Word {
                    text: pair.as_str().trim_matches('`').to_owned(),
                    span,
                    line,
                },
                Shape::Literal => TokenTree::Literal {
                    text: pair.as_str().to_owned(),
                    span,
                    line,
                },
                Shape::Symbol => TokenTree::Symbol {
                    ch: pair.as_str().chars().next()?,
                    span,
                    line,
                },
            };
            Some(token)
        })
        .collect()
}

/// Dotted receiver chain in front of `tokens[name_idx]`.
///
/// Returns the qualifier (if any) and the index where the chain starts.
/// Kotlin safe calls (`a?.b()`) are treated like plain member access.
pub(crate) fn qualifier_before(tokens: &[TokenTree], name_idx: usize) -> (Option<String>, usize) {
    let mut parts = Vec::new();
    let mut start = name_idx;
    while start >= 2 && tokens[start - 1].is_symbol('.') {
        let mut j = start - 2;
        if tokens[j].is_symbol('?') {
            if j == 0 {
                break;
            }
            j -= 1;
        }
        match tokens[j].as_word() {
            Some(word) => {
                parts.push(word);
                start = j;
            }
            None => break,
        }
    }
    parts.reverse();
    let qualifier = (!parts.is_empty()).then(|| parts.join("."));
    (qualifier, start)
}

/// Number of comma-separated parameters, ignoring commas nested in `<...>`.
pub(crate) fn count_params(children: &[TokenTree]) -> usize {
    let mut count = 0;
    let mut angle = 0usize;
    let mut segment_open = false;
    for token in children {
        match token {
            TokenTree::Symbol { ch: '<', .. } => {
                angle += 1;
                segment_open = true;
            }
            TokenTree::Symbol { ch: '>', .. } => {
                angle = angle.saturating_sub(1);
                segment_open = true;
            }
            TokenTree::Symbol { ch: ',', .. } if angle == 0 => {
                if segment_open {
                    count += 1;
                }
                segment_open = false;
            }
            _ => segment_open = true,
        }
    }
    if segment_open {
        count += 1;
    }
    count
}
