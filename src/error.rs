//! Errors reported by pattern compilation and search.

/// Errors that can occur while compiling a pattern or running a search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The pattern text is malformed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// The pattern is well formed but its program would be too large.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A configured execution limit was hit during a search.
    #[error("execution limit exceeded after {steps} steps ({history} capture records)")]
    ExecutionLimitExceeded { steps: u64, history: usize },
}

/// Result type for regex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A malformed pattern, with the character offset where the problem was found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct SyntaxError {
    pub offset: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub(crate) fn new(offset: usize, kind: SyntaxErrorKind) -> Self {
        Self { offset, kind }
    }
}

/// Category of a [`SyntaxError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("unbalanced parenthesis")]
    UnbalancedGroup,

    #[error("invalid repetition bounds")]
    BadQuantifierBounds,

    #[error("quantifier does not follow a repeatable item")]
    DanglingQuantifier,

    #[error("invalid escape sequence")]
    BadEscape,

    #[error("unterminated character class")]
    UnterminatedClass,

    #[error("invalid character class range")]
    BadClassRange,

    #[error("unsupported group syntax")]
    BadGroup,

    #[error("duplicate group name `{0}`")]
    DuplicateGroupName(String),

    #[error("groups nested deeper than the limit of {0}")]
    NestLimitExceeded(u32),
}

/// A pattern whose compiled program would exceed the configured limits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("repetition count {count} exceeds the limit of {limit}")]
    RepetitionTooLarge { count: u32, limit: u32 },

    #[error("compiled program exceeds the limit of {limit} instructions")]
    ProgramTooLarge { limit: usize },
}
