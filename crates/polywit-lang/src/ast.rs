/// Byte range into the parsed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Brace,
    Paren,
    Bracket,
}

/// Delimiter-balanced token tree produced by the grammars.
///
/// Only the shape needed by the recognisers is kept: groups, identifiers,
/// literals and single-character punctuation.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenTree {
    Group {
        delimiter: Delimiter,
        children: Vec<TokenTree>,
        span: Span,
        line: u32,
    },
    Word {
        text: String,
        span: Span,
        line: u32,
    },
    Literal {
        text: String,
        span: Span,
        line: u32,
    },
    Symbol {
        ch: char,
        span: Span,
        line: u32,
    },
}

impl TokenTree {
    pub fn line(&self) -> u32 {
        match self {
            TokenTree::Group { line, .. }
            | TokenTree::Word { line, .. }
            | TokenTree::Literal { line, .. }
            | TokenTree::Symbol { line, .. } => *line,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TokenTree::Group { span, .. }
            | TokenTree::Word { span, .. }
            | TokenTree::Literal { span, .. }
            | TokenTree::Symbol { span, .. } => *span,
        }
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            TokenTree::Word { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_word(&self, expected: &str) -> bool {
        self.as_word() == Some(expected)
    }

    pub fn is_symbol(&self, expected: char) -> bool {
        matches!(self, TokenTree::Symbol { ch, .. } if *ch == expected)
    }

    /// Children of a group with the given delimiter.
    pub fn group(&self, expected: Delimiter) -> Option<&[TokenTree]> {
        match self {
            TokenTree::Group {
                delimiter,
                children,
                ..
            } if *delimiter == expected => Some(children),
            _ => None,
        }
    }
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.b.C.m;`, `import a.b.C as D`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Dotted path without the trailing `.*`.
    pub path: String,
    pub wildcard: bool,
    pub is_static: bool,
    pub alias: Option<String>,
    pub line: u32,
}

impl Import {
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

/// A call `qualifier.name(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    /// Dotted receiver chain directly in front of the name, if it is made of
    /// plain identifiers.
    pub qualifier: Option<String>,
    /// Line of the callee name.
    pub line: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub name: String,
    pub param_count: usize,
    pub line: u32,
    pub name_span: Span,
    /// Span of the parenthesised parameter list, delimiters included.
    pub params_span: Span,
    /// Number of enclosing brace blocks; zero for Kotlin top-level functions.
    pub depth: usize,
    /// Line of the first body statement when that statement is a `return`
    /// (or a Kotlin expression body).
    pub first_return_line: Option<u32>,
}

impl FunctionDecl {
    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }
}

/// What a parse-tree provider exposes about one source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyntaxTree {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub calls: Vec<CallSite>,
    pub functions: Vec<FunctionDecl>,
}

impl SyntaxTree {
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Call sites accepted by `pattern`, in source order.
    pub fn find_calls<'a, P>(&'a self, mut pattern: P) -> impl Iterator<Item = &'a CallSite> + 'a
    where
        P: FnMut(&CallSite) -> bool + 'a,
    {
        self.calls.iter().filter(move |call| pattern(call))
    }

    pub fn function_declarations(&self) -> &[FunctionDecl] {
        &self.functions
    }
}
