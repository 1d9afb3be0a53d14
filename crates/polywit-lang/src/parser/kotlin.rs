#![allow(clippy::result_large_err)]

use std::collections::HashSet;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::{build_tokens, count_params, qualifier_before, LineIndex, Shape};
use crate::ast::*;
use crate::errors::ParseError;
use crate::{ParseTreeProvider, SourceLanguage};

#[derive(Parser)]
#[grammar = "parser/kotlin.pest"]
struct KotlinGrammar;

const KEYWORDS: &[&str] = &[
    "as",
    "catch",
    "constructor",
    "do",
    "else",
    "for",
    "fun",
    "if",
    "in",
    "init",
    "is",
    "object",
    "return",
    "super",
    "this",
    "throw",
    "try",
    "typeof",
    "when",
    "while",
];

/// A word in front of `Name(` that makes it a declaration rather than a call.
const DECLARATORS: &[&str] = &["class", "interface", "object", "constructor", "fun"];

/// Words that end the search for a function body.
const BODY_STOP: &[&str] = &[
    "abstract", "class", "companion", "const", "data", "enum", "fun", "inline", "interface",
    "internal", "lateinit", "object", "open", "operator", "override", "private", "protected",
    "public", "sealed", "suspend", "val", "var",
];

/// Parse-tree provider for `.kt` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct KotlinProvider;

impl ParseTreeProvider for KotlinProvider {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Kotlin
    }

    fn parse(&self, source: &str, filename: &str) -> Result<SyntaxTree, ParseError> {
        let file = KotlinGrammar::parse(Rule::kotlin_file, source)
            .map_err(|e| ParseError::from_pest(e, source, filename))?
            .next()
            .ok_or_else(|| ParseError::Empty {
                file: filename.to_owned(),
            })?;

        let lines = LineIndex::new(source);
        let mut tree = SyntaxTree::default();
        for pair in file.into_inner() {
            match pair.as_rule() {
                Rule::package_header => {
                    tree.package = pair
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::qualified_name)
                        .map(dotted);
                }
                Rule::import_header => tree.imports.push(parse_import(pair, &lines)),
                Rule::body => {
                    let tokens = build_tokens(pair.into_inner(), &shape, &lines);
                    recognise(&tokens, 0, &mut tree);
                }
                _ => {}
            }
        }
        Ok(tree)
    }
}

fn shape(rule: Rule) -> Option<Shape> {
    match rule {
        Rule::brace_group => Some(Shape::Group(Delimiter::Brace)),
        Rule::paren_group => Some(Shape::Group(Delimiter::Paren)),
        Rule::bracket_group => Some(Shape::Group(Delimiter::Bracket)),
        Rule::word => Some(Shape::Word),
        Rule::symbol => Some(Shape::Symbol),
        Rule::raw_string | Rule::string_literal | Rule::char_literal | Rule::number => {
            Some(Shape::Literal)
        }
        _ => None,
    }
}

fn unquote(identifier: &str) -> &str {
    identifier.trim_matches('`')
}

fn dotted(pair: Pair<'_, Rule>) -> String {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::identifier)
        .map(|p| unquote(p.as_str()))
        .collect::<Vec<_>>()
        .join(".")
}

fn parse_import(pair: Pair<'_, Rule>, lines: &LineIndex) -> Import {
    let line = lines.line_of(pair.as_span().start());
    let mut import = Import {
        path: String::new(),
        wildcard: false,
        is_static: false,
        alias: None,
        line,
    };
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::qualified_name => import.path = dotted(part),
            Rule::wildcard => import.wildcard = true,
            Rule::import_alias => {
                import.alias = part
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::identifier)
                    .map(|p| unquote(p.as_str()).to_owned());
            }
            _ => {}
        }
    }
    import
}

/// Body of a function whose parameter list sits at `params_idx`.
enum Body<'a> {
    Block(&'a [TokenTree]),
    Expression(&'a TokenTree),
    Missing,
}

fn body_after(tokens: &[TokenTree], params_idx: usize) -> Body<'_> {
    let mut k = params_idx + 1;
    while let Some(t) = tokens.get(k) {
        if let Some(block) = t.group(Delimiter::Brace) {
            return Body::Block(block);
        }
        if t.is_symbol('=') {
            return tokens.get(k + 1).map_or(Body::Missing, Body::Expression);
        }
        if t.is_symbol(';') || t.is_symbol('@') {
            return Body::Missing;
        }
        if t.as_word().is_some_and(|w| BODY_STOP.contains(&w)) {
            return Body::Missing;
        }
        k += 1;
    }
    Body::Missing
}

/// Index of the parameter list belonging to the `fun` at `fun_idx`.
fn params_of_fun(tokens: &[TokenTree], fun_idx: usize) -> Option<usize> {
    for (k, t) in tokens.iter().enumerate().skip(fun_idx + 1) {
        if t.group(Delimiter::Paren).is_some() {
            return Some(k);
        }
        if t.group(Delimiter::Brace).is_some() || t.is_symbol('=') {
            return None;
        }
    }
    None
}

fn recognise(tokens: &[TokenTree], depth: usize, tree: &mut SyntaxTree) {
    let mut declared = HashSet::new();
    for (i, token) in tokens.iter().enumerate() {
        if !token.is_word("fun") {
            continue;
        }
        let Some(params_idx) = params_of_fun(tokens, i) else {
            continue;
        };
        // Anonymous functions: `fun(x: Int) = ...`.
        if params_idx == i + 1 {
            continue;
        }
        let name_token = &tokens[params_idx - 1];
        let Some(name) = name_token.as_word() else {
            continue;
        };
        let params = &tokens[params_idx];
        let first_return_line = match body_after(tokens, params_idx) {
            Body::Block(block) => block
                .first()
                .filter(|t| t.is_word("return"))
                .map(TokenTree::line),
            Body::Expression(expr) => Some(expr.line()),
            Body::Missing => None,
        };
        tree.functions.push(FunctionDecl {
            name: name.to_owned(),
            param_count: params.group(Delimiter::Paren).map_or(0, count_params),
            line: name_token.line(),
            name_span: name_token.span(),
            params_span: params.span(),
            depth,
            first_return_line,
        });
        declared.insert(params_idx - 1);
    }

    for (i, token) in tokens.iter().enumerate() {
        if let TokenTree::Group {
            delimiter,
            children,
            ..
        } = token
        {
            let inner = if *delimiter == Delimiter::Brace { depth + 1 } else { depth };
            recognise(children, inner, tree);
            continue;
        }
        let Some(name) = token.as_word() else {
            continue;
        };
        if KEYWORDS.contains(&name) || declared.contains(&i) {
            continue;
        }
        if tokens.get(i + 1).and_then(|t| t.group(Delimiter::Paren)).is_none() {
            continue;
        }
        if i > 0 {
            let prev = &tokens[i - 1];
            if prev.is_symbol('@') || prev.as_word().is_some_and(|w| DECLARATORS.contains(&w)) {
                continue;
            }
        }
        let (qualifier, _) = qualifier_before(tokens, i);
        tree.calls.push(CallSite {
            name: name.to_owned(),
            qualifier,
            line: token.line(),
            span: token.span(),
        });
    }
}
