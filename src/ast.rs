/// AST types for the regex engine.

/// A parsed pattern: the root node plus the capturing group table.
#[derive(Debug, Clone)]
pub struct Ast {
    pub root: AstNode,
    /// One entry per group id. Entry 0 is the whole match and never has a name.
    pub group_names: Vec<Option<String>>,
}

impl Ast {
    /// Number of capturing groups, not counting the whole match.
    pub fn group_count(&self) -> usize {
        self.group_names.len() - 1
    }
}

/// A single node in the regex AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    /// Matches a single literal character.
    Literal(char),
    /// Matches any character (newline only in dot-matches-newline mode).
    Dot,
    /// Concatenation of nodes (implicit in `ab`). Empty for the empty pattern.
    Concat(Vec<AstNode>),
    /// Alternation (`a|b`). Earlier branches have priority.
    Alternation(Vec<AstNode>),
    /// `node` repeated between `min` and `max` times (`None` = unbounded).
    Repetition {
        node: Box<AstNode>,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    },
    /// Character class like `[abc]`, `[a-z]`, `[^abc]`.
    CharClass {
        items: Vec<ClassItem>,
        negated: bool,
    },
    /// Shorthand class: `\d`, `\w`, `\s` and their negations.
    ShorthandClass(ShorthandKind),
    /// Zero-width assertion.
    Anchor(AnchorKind),
    /// Parenthesized group. `index` is `None` for `(?:...)`.
    Group {
        node: Box<AstNode>,
        index: Option<usize>,
        name: Option<String>,
    },
}

impl AstNode {
    /// The empty expression, as in `a|` or `()`.
    pub fn empty() -> Self {
        AstNode::Concat(Vec::new())
    }
}

/// Item within a character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem {
    /// Single character.
    Literal(char),
    /// Character range `a-z`.
    Range(char, char),
    /// Shorthand within a class, e.g. `[\d]`.
    Shorthand(ShorthandKind),
}

/// Shorthand character class kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShorthandKind {
    /// `\d`: digits.
    Digit,
    /// `\D`: non-digits.
    NonDigit,
    /// `\w`: word characters.
    Word,
    /// `\W`: non-word characters.
    NonWord,
    /// `\s`: whitespace.
    Space,
    /// `\S`: non-whitespace.
    NonSpace,
}

/// Anchor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// `^`: start of text, or of a line in multiline mode.
    Start,
    /// `$`: end of text, or of a line in multiline mode.
    End,
    /// `\A`: start of text regardless of flags.
    TextStart,
    /// `\z` and `\Z`: end of text regardless of flags.
    TextEnd,
    /// `\b`: word boundary.
    WordBoundary,
    /// `\B`: non-word boundary.
    NonWordBoundary,
}
