//! Linear-time regular expressions that remember every capture.
//!
//! Patterns compile to a Thompson NFA program that a Pike VM runs over the
//! input in `O(program size × input length)` time, so nested quantifiers
//! never backtrack exponentially. Each candidate path carries a persistent
//! capture history, which lets a repeated group report all of its
//! iterations instead of only the last one.
//!
//! # Example
//!
//! ```
//! use regex_history::Regex;
//!
//! let re = Regex::new(r"(\d+)(,(\d+))*").unwrap();
//! let m = re.find("12,34,56").unwrap();
//! assert_eq!(m.get(1), Some("12"));
//! assert_eq!(m.get(3), Some("56"));
//! assert_eq!(m.get_all(3), vec!["34", "56"]);
//! ```

pub mod ast;
mod captures;
mod class;
pub mod compiler;
mod config;
mod error;
mod history;
pub mod parser;
mod vm;

#[cfg(test)]
mod captures_tests;
#[cfg(test)]
mod vm_tests;

use std::sync::Arc;

use log::debug;

pub use captures::{Match, Span};
pub use class::CharClass;
pub use compiler::{Inst, Look, Program};
pub use config::{CompileLimits, ExecLimits, Flags};
pub use error::{CompileError, Error, Result, SyntaxError, SyntaxErrorKind};
pub use vm::{Budget, Unlimited};

/// A compiled regular expression.
///
/// Immutable after construction; share it freely between threads.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: String,
    flags: Flags,
    program: Program,
    names: Arc<[Option<String>]>,
}

impl Regex {
    /// Compile `pattern` with default flags and limits.
    pub fn new(pattern: &str) -> Result<Regex> {
        RegexBuilder::new(pattern).build()
    }

    /// Compile `pattern` with the given flags and default limits.
    pub fn with_flags(pattern: &str, flags: Flags) -> Result<Regex> {
        RegexBuilder::new(pattern).flags(flags).build()
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Number of groups including group 0.
    pub fn captures_len(&self) -> usize {
        self.names.len()
    }

    /// Group names by id; unnamed groups (and group 0) yield `None`.
    pub fn group_names(&self) -> impl Iterator<Item = Option<&str>> {
        self.names.iter().map(Option::as_deref)
    }

    /// Look up a named group's id.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.program.group_index(name)
    }

    /// Leftmost match anywhere in `haystack`.
    pub fn find<'h>(&self, haystack: &'h str) -> Option<Match<'h>> {
        self.find_at(haystack, 0)
    }

    /// Leftmost match starting at or after byte offset `start`.
    ///
    /// An offset inside a multi-byte character is moved forward to the
    /// next character boundary. Anchors still see the whole haystack, so
    /// `^` does not match at `start > 0` unless multiline mode allows it.
    pub fn find_at<'h>(&self, haystack: &'h str, start: usize) -> Option<Match<'h>> {
        let Ok(found) = self.run(haystack, start, false, &mut Unlimited);
        found
    }

    /// Match that starts exactly at byte offset `start`.
    pub fn match_at<'h>(&self, haystack: &'h str, start: usize) -> Option<Match<'h>> {
        let Ok(found) = self.run(haystack, start, true, &mut Unlimited);
        found
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.find(haystack).is_some()
    }

    /// Like [`Regex::find_at`], giving up once `limits` are exceeded.
    pub fn find_with<'h>(
        &self,
        haystack: &'h str,
        start: usize,
        limits: ExecLimits,
    ) -> Result<Option<Match<'h>>> {
        let mut limits = limits;
        self.run(haystack, start, false, &mut limits)
    }

    /// Successive non-overlapping matches.
    ///
    /// An empty match directly after the previous match is skipped.
    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h str) -> FindIter<'r, 'h> {
        FindIter {
            regex: self,
            haystack,
            at: 0,
            last_end: None,
        }
    }

    /// Substrings of `haystack` separated by matches.
    pub fn split<'r, 'h>(&'r self, haystack: &'h str) -> Split<'r, 'h> {
        Split {
            finder: self.find_iter(haystack),
            last: 0,
            done: false,
        }
    }

    fn run<'h, B: Budget>(
        &self,
        haystack: &'h str,
        start: usize,
        anchored: bool,
        budget: &mut B,
    ) -> std::result::Result<Option<Match<'h>>, B::Error> {
        let Some(start) = (start..=haystack.len()).find(|&i| haystack.is_char_boundary(i)) else {
            return Ok(None);
        };
        let accepted = vm::search(&self.program, haystack, start, anchored, budget)?;
        Ok(accepted.and_then(|accepted| {
            Match::from_history(haystack, &accepted.history, accepted.tip, self.names.clone())
        }))
    }
}

impl std::str::FromStr for Regex {
    type Err = Error;

    fn from_str(pattern: &str) -> Result<Regex> {
        Regex::new(pattern)
    }
}

impl std::fmt::Display for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Configures and compiles a [`Regex`].
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: String,
    flags: Flags,
    limits: CompileLimits,
}

impl RegexBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_owned(),
            flags: Flags::default(),
            limits: CompileLimits::default(),
        }
    }

    /// Fold case when comparing characters.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.flags.case_insensitive = yes;
        self
    }

    /// Let `^` and `$` match at line boundaries.
    pub fn multiline(mut self, yes: bool) -> Self {
        self.flags.multiline = yes;
        self
    }

    /// Let `.` match `\n`.
    pub fn dot_matches_new_line(mut self, yes: bool) -> Self {
        self.flags.dotall = yes;
        self
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn limits(mut self, limits: CompileLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn max_repetition(mut self, limit: u32) -> Self {
        self.limits = self.limits.max_repetition(limit);
        self
    }

    pub fn max_instructions(mut self, limit: usize) -> Self {
        self.limits = self.limits.max_instructions(limit);
        self
    }

    pub fn nest_limit(mut self, limit: u32) -> Self {
        self.limits = self.limits.nest_limit(limit);
        self
    }

    /// Parse and compile the pattern.
    pub fn build(self) -> Result<Regex> {
        let ast = parser::Parser::new(&self.pattern)
            .nest_limit(self.limits.nest_limit)
            .parse()?;
        let program = compiler::compile(&ast, self.flags, self.limits)?;
        debug!("compiled pattern {:?} with {:?}", self.pattern, self.flags);
        let names = program.group_names().to_vec().into();
        Ok(Regex {
            pattern: self.pattern,
            flags: self.flags,
            program,
            names,
        })
    }
}

/// Iterator returned by [`Regex::find_iter`].
#[derive(Debug)]
pub struct FindIter<'r, 'h> {
    regex: &'r Regex,
    haystack: &'h str,
    at: usize,
    last_end: Option<usize>,
}

impl<'h> Iterator for FindIter<'_, 'h> {
    type Item = Match<'h>;

    fn next(&mut self) -> Option<Match<'h>> {
        loop {
            if self.at > self.haystack.len() {
                return None;
            }
            let found = self.regex.find_at(self.haystack, self.at)?;
            if found.start() == found.end() {
                self.at = self.haystack[found.end()..]
                    .chars()
                    .next()
                    .map_or(found.end() + 1, |ch| found.end() + ch.len_utf8());
                if self.last_end == Some(found.end()) {
                    continue;
                }
            } else {
                self.at = found.end();
            }
            self.last_end = Some(found.end());
            return Some(found);
        }
    }
}

/// Iterator returned by [`Regex::split`].
#[derive(Debug)]
pub struct Split<'r, 'h> {
    finder: FindIter<'r, 'h>,
    last: usize,
    done: bool,
}

impl<'h> Iterator for Split<'_, 'h> {
    type Item = &'h str;

    fn next(&mut self) -> Option<&'h str> {
        let haystack = self.finder.haystack;
        match self.finder.next() {
            Some(found) => {
                let piece = &haystack[self.last..found.start()];
                self.last = found.end();
                Some(piece)
            }
            None if self.done => None,
            None => {
                self.done = true;
                Some(&haystack[self.last..])
            }
        }
    }
}
