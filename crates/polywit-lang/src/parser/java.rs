#![allow(clippy::result_large_err)]

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::{build_tokens, count_params, qualifier_before, LineIndex, Shape};
use crate::ast::*;
use crate::errors::ParseError;
use crate::{ParseTreeProvider, SourceLanguage};

#[derive(Parser)]
#[grammar = "parser/java.pest"]
struct JavaGrammar;

/// Words that are never a callee or method name.
const KEYWORDS: &[&str] = &[
    "assert",
    "case",
    "catch",
    "default",
    "do",
    "else",
    "for",
    "if",
    "instanceof",
    "new",
    "return",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "try",
    "while",
    "yield",
];

/// Words that can precede a call but never a declared method name.
const EXPRESSION_STARTERS: &[&str] = &["assert", "case", "do", "else", "return", "throw", "yield"];

/// Parse-tree provider for `.java` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaProvider;

impl ParseTreeProvider for JavaProvider {
    fn language(&self) -> SourceLanguage {
        SourceLanguage::Java
    }

    fn parse(&self, source: &str, filename: &str) -> Result<SyntaxTree, ParseError> {
        let unit = JavaGrammar::parse(Rule::compilation_unit, source)
            .map_err(|e| ParseError::from_pest(e, source, filename))?
            .next()
            .ok_or_else(|| ParseError::Empty {
                file: filename.to_owned(),
            })?;

        let lines = LineIndex::new(source);
        let mut tree = SyntaxTree::default();
        for pair in unit.into_inner() {
            match pair.as_rule() {
                Rule::package_decl => {
                    tree.package = pair
                        .into_inner()
                        .filter(|p| p.as_rule() == Rule::qualified_name)
                        .last()
                        .map(dotted);
                }
                Rule::import_decl => tree.imports.push(parse_import(pair, &lines)),
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
        Rule::text_block | Rule::string_literal | Rule::char_literal | Rule::number => {
            Some(Shape::Literal)
        }
        _ => None,
    }
}

fn dotted(pair: Pair<'_, Rule>) -> String {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::identifier)
        .map(|p| p.as_str())
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
            Rule::static_modifier => import.is_static = true,
            Rule::qualified_name => import.path = dotted(part),
            Rule::wildcard => import.wildcard = true,
            _ => {}
        }
    }
    import
}

/// What follows a `name(...)` that makes it a method declaration.
enum Declaration<'a> {
    Body(&'a [TokenTree]),
    Abstract,
}

fn declaration_after<'a>(tokens: &'a [TokenTree], name_idx: usize) -> Option<Declaration<'a>> {
    let prev = name_idx.checked_sub(1).map(|p| &tokens[p]);
    if prev.is_some_and(|p| p.is_symbol('.')) {
        return None;
    }
    let mut k = name_idx + 2;
    if tokens.get(k).is_some_and(|t| t.is_word("throws")) {
        while let Some(t) = tokens.get(k) {
            if t.group(Delimiter::Brace).is_some() || t.is_symbol(';') {
                break;
            }
            k += 1;
        }
    }
    match tokens.get(k)? {
        t if t.group(Delimiter::Brace).is_some() => t.group(Delimiter::Brace).map(Declaration::Body),
        t if t.is_symbol(';') => {
            let typed = match prev {
                Some(TokenTree::Word { text, .. }) => !EXPRESSION_STARTERS.contains(&text.as_str()),
                Some(TokenTree::Group {
                    delimiter: Delimiter::Bracket,
                    ..
                }) => true,
                _ => false,
            };
            typed.then_some(Declaration::Abstract)
        }
        _ => None,
    }
}

fn recognise(tokens: &[TokenTree], depth: usize, tree: &mut SyntaxTree) {
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
        if KEYWORDS.contains(&name) {
            continue;
        }
        let Some(params) = tokens.get(i + 1) else {
            continue;
        };
        let Some(param_tokens) = params.group(Delimiter::Paren) else {
            continue;
        };
        // Annotation arguments: `@Foo(...)`.
        if i > 0 && tokens[i - 1].is_symbol('@') {
            continue;
        }

        let (qualifier, chain_start) = qualifier_before(tokens, i);
        if chain_start > 0 && tokens[chain_start - 1].is_word("new") {
            continue;
        }

        if let Some(declaration) = declaration_after(tokens, i) {
            let first_return_line = match declaration {
                Declaration::Body(body) => body
                    .first()
                    .filter(|t| t.is_word("return"))
                    .map(TokenTree::line),
                Declaration::Abstract => None,
            };
            tree.functions.push(FunctionDecl {
                name: name.to_owned(),
                param_count: count_params(param_tokens),
                line: token.line(),
                name_span: token.span(),
                params_span: params.span(),
                depth,
                first_return_line,
            });
            continue;
        }

        tree.calls.push(CallSite {
            name: name.to_owned(),
            qualifier,
            line: token.line(),
            span: token.span(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SyntaxTree {
        JavaProvider.parse(src, "Main.java").expect("parse failed")
    }

    #[test]
    fn parse_package_and_imports() {
        let tree = parse(
            r#"
package org.example.app;

import java.util.Scanner;
import static org.example.util.Helper.read;
import org.example.model.*;
import org.sosy_lab.sv_benchmarks.Verifier;

public class Main {}
"#,
        );
        assert_eq!(tree.package.as_deref(), Some("org.example.app"));
        assert_eq!(tree.imports.len(), 4);
        assert_eq!(tree.imports[0].path, "java.util.Scanner");
        assert_eq!(tree.imports[0].line, 4);
        assert!(tree.imports[1].is_static);
        assert_eq!(tree.imports[1].path, "org.example.util.Helper.read");
        assert!(tree.imports[2].wildcard);
        assert_eq!(tree.imports[2].path, "org.example.model");
        assert!(!tree.imports[3].wildcard);
    }

    #[test]
    fn finds_verifier_calls_with_lines() {
        let tree = parse(
            r#"import org.sosy_lab.sv_benchmarks.Verifier;

public class Main {
  public static void main(String[] args) {
    int x = Verifier.nondetInt();
    boolean b =
        org.sosy_lab.sv_benchmarks.Verifier.nondetBoolean();
    assert x != 5 || b;
  }
}
"#,
        );
        let calls: Vec<_> = tree.find_calls(|c| c.name.starts_with("nondet")).collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "nondetInt");
        assert_eq!(calls[0].qualifier.as_deref(), Some("Verifier"));
        assert_eq!(calls[0].line, 5);
        assert_eq!(
            calls[1].qualifier.as_deref(),
            Some("org.sosy_lab.sv_benchmarks.Verifier")
        );
        assert_eq!(calls[1].line, 7);
        assert_eq!(tree.functions.len(), 1);
        assert_eq!(tree.functions[0].name, "main");
        assert_eq!(tree.functions[0].param_count, 1);
        assert_eq!(tree.functions[0].depth, 1);
    }

    #[test]
    fn detects_wrapper_with_leading_return() {
        let tree = parse(
            r#"class Util {
  static int read() {
    return Verifier.nondetInt();
  }
  static int other(int y) throws Exception {
    int z = y;
    return z;
  }
  abstract int shape();
}
"#,
        );
        let read = &tree.functions[0];
        assert_eq!(read.name, "read");
        assert_eq!(read.param_count, 0);
        assert_eq!(read.first_return_line, Some(3));
        let other = &tree.functions[1];
        assert_eq!(other.name, "other");
        assert_eq!(other.first_return_line, None);
        assert_eq!(tree.functions[2].name, "shape");
        assert!(tree.calls.iter().all(|c| c.name != "read" && c.name != "shape"));
    }

    #[test]
    fn skips_constructors_annotations_and_control_flow() {
        let tree = parse(
            r#"class A {
  @SuppressWarnings("unchecked")
  void run() {
    Object o = new java.util.ArrayList(3);
    if (check(o)) { helper(); }
    while (true) { return; }
  }
}
"#,
        );
        let names: Vec<_> = tree.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["check", "helper"]);
    }

    #[test]
    fn ignores_calls_inside_comments_and_strings() {
        let tree = parse(
            r#"class A {
  // Verifier.nondetInt();
  /* Verifier.nondetLong(); */
  String s = "Verifier.nondetChar()";
  char c = '(';
}
"#,
        );
        assert!(tree.calls.is_empty());
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let err = JavaProvider
            .parse("class A { void f() { }", "A.java")
            .unwrap_err();
        assert_eq!(err.file(), "A.java");
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(JavaProvider
            .parse("class A { String s = \"open; }", "A.java")
            .is_err());
    }
}
