use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// Byte range into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span(start..end)
    }

    pub fn start(&self) -> usize {
        self.0.start
    }

    pub fn end(&self) -> usize {
        self.0.end
    }

    pub fn len(&self) -> usize {
        self.0.end - self.0.start
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span(range)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("expression is empty")]
    EmptyExpression,

    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("malformed number literal")]
    MalformedLiteral,

    #[error("number literal does not fit in 32 bits")]
    LiteralOverflow,

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("identifier '{0}' is ambiguous")]
    AmbiguousIdentifier(String),

    #[error("operator expected")]
    MissingOperator,

    #[error("operand expected after '{0}'")]
    MissingOperand(char),

    #[error("operator '{0}' has no left operand")]
    MisplacedOperator(char),

    #[error("unary '+' is not supported")]
    UnaryPlus,

    #[error("opening brace is never closed")]
    UnmatchedOpeningBrace,

    #[error("closing brace has no matching opening brace")]
    UnmatchedClosingBrace,

    #[error("empty braces")]
    EmptyBraces,

    #[error("argument expected after separator")]
    MisplacedSeparator,

    #[error("argument separator outside of a function call")]
    SeparatorOutsideCall,

    #[error("opening brace must follow function name '{0}'")]
    MissingCallBrace(String),

    #[error("no overload of '{name}' takes {count} argument(s)")]
    WrongArgumentCount { name: String, count: usize },

    #[error("expression is nested deeper than {0} levels")]
    TooDeep(usize),
}

/// A positioned parse failure. Carries its own copy of the input so it can
/// be rendered after the caller's string is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
    pub input: String,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: impl Into<Span>, input: &str) -> Self {
        Self {
            kind,
            span: span.into(),
            input: input.to_owned(),
        }
    }

    pub fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn position(&self) -> usize {
        self.span.start()
    }

    pub fn length(&self) -> usize {
        self.span.len()
    }

    /// The offending slice of the input.
    pub fn snippet(&self) -> &str {
        self.input.get(self.span.0.clone()).unwrap_or_default()
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.kind, self.span.start())
    }
}

impl std::error::Error for SyntaxError {}
