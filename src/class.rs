//! Single-character predicates used by the compiled program.

use std::fmt;

use crate::ast::{ClassItem, ShorthandKind};

/// A compiled character class: a union of items, optionally negated and case folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    items: Vec<ClassItem>,
    negated: bool,
    case_insensitive: bool,
}

impl CharClass {
    pub fn new(items: Vec<ClassItem>, negated: bool, case_insensitive: bool) -> Self {
        CharClass {
            items,
            negated,
            case_insensitive,
        }
    }

    /// A class matching every simple case variant of `ch`.
    pub fn folded_literal(ch: char) -> Self {
        let mut items: Vec<ClassItem> = Vec::with_capacity(3);
        for variant in case_variants(ch) {
            let item = ClassItem::Literal(variant);
            if !items.contains(&item) {
                items.push(item);
            }
        }
        CharClass::new(items, false, false)
    }

    /// Check if a character matches the class.
    pub fn matches(&self, ch: char) -> bool {
        let matched = if self.case_insensitive {
            case_variants(ch).into_iter().any(|c| self.contains(c))
        } else {
            self.contains(ch)
        };
        matched != self.negated
    }

    fn contains(&self, ch: char) -> bool {
        self.items.iter().any(|item| match *item {
            ClassItem::Literal(c) => ch == c,
            ClassItem::Range(lo, hi) => lo <= ch && ch <= hi,
            ClassItem::Shorthand(kind) => kind.matches(ch),
        })
    }
}

impl ShorthandKind {
    /// Check if a character matches this shorthand class.
    pub fn matches(self, ch: char) -> bool {
        match self {
            ShorthandKind::Digit => ch.is_ascii_digit(),
            ShorthandKind::NonDigit => !ch.is_ascii_digit(),
            ShorthandKind::Word => is_word_char(ch),
            ShorthandKind::NonWord => !is_word_char(ch),
            ShorthandKind::Space => ch.is_whitespace(),
            ShorthandKind::NonSpace => !ch.is_whitespace(),
        }
    }

    fn letter(self) -> char {
        match self {
            ShorthandKind::Digit => 'd',
            ShorthandKind::NonDigit => 'D',
            ShorthandKind::Word => 'w',
            ShorthandKind::NonWord => 'W',
            ShorthandKind::Space => 's',
            ShorthandKind::NonSpace => 'S',
        }
    }
}

impl fmt::Display for ShorthandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\{}", self.letter())
    }
}

pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// `ch` followed by its single-character lower and upper case mappings.
///
/// Mappings that expand to several characters (like `ß` → `SS`) are skipped.
pub fn case_variants(ch: char) -> [char; 3] {
    [
        ch,
        single(ch.to_lowercase()).unwrap_or(ch),
        single(ch.to_uppercase()).unwrap_or(ch),
    ]
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

/// Writes `ch` the way it would be written inside a class or pattern.
pub(crate) fn write_char(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    match ch {
        '\\' | ']' | '[' | '-' | '^' => write!(f, "\\{ch}"),
        _ if ch.is_control() || ch.is_whitespace() => write!(f, "{}", ch.escape_default()),
        _ => write!(f, "{ch}"),
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.negated { "[^" } else { "[" })?;
        for item in &self.items {
            match *item {
                ClassItem::Literal(c) => write_char(f, c)?,
                ClassItem::Range(lo, hi) => {
                    write_char(f, lo)?;
                    f.write_str("-")?;
                    write_char(f, hi)?;
                }
                ClassItem::Shorthand(kind) => write!(f, "{kind}")?,
            }
        }
        f.write_str("]")?;
        if self.case_insensitive {
            f.write_str("/i")?;
        }
        Ok(())
    }
}
