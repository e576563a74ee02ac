/// Compiler: converts the AST into NFA instructions for the Pike VM.
use std::fmt;

use log::debug;

use crate::ast::*;
use crate::class::{CharClass, case_variants, is_word_char};
use crate::config::{CompileLimits, Flags};
use crate::error::CompileError;

/// VM instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    /// Match a specific character.
    Char(char),
    /// Match a character class.
    Class(CharClass),
    /// Match any character.
    Any,
    /// Match any character except `\n`.
    AnyExceptNewline,
    /// Fork: `first` has priority over `second`.
    Split(usize, usize),
    /// Jump to target instruction.
    Jump(usize),
    /// Back edge of a `*` loop: jump to the loop head, or to the exit when
    /// the head was already entered at the current position.
    ///
    /// An iteration that consumed nothing thus leaves the loop with its
    /// captures instead of dying at the head.
    Loop { head: usize, exit: usize },
    /// Record the current position as a capture boundary.
    /// Even slots open group `slot / 2`, odd slots close it.
    Save(usize),
    /// Zero-width assertion on the surrounding characters.
    Assert(Look),
    /// Successful match.
    Match,
}

/// Zero-width assertion kinds, resolved against the flags at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Look {
    TextStart,
    TextEnd,
    LineStart,
    LineEnd,
    WordBoundary,
    NonWordBoundary,
}

impl Look {
    /// Check the assertion at byte offset `at` of `haystack`.
    pub fn holds(self, haystack: &str, at: usize) -> bool {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at..].chars().next();
        match self {
            Look::TextStart => at == 0,
            Look::TextEnd => at == haystack.len(),
            Look::LineStart => before.is_none_or(|ch| ch == '\n'),
            Look::LineEnd => after.is_none_or(|ch| ch == '\n'),
            Look::WordBoundary => is_word_boundary(before, after),
            Look::NonWordBoundary => !is_word_boundary(before, after),
        }
    }
}

fn is_word_boundary(before: Option<char>, after: Option<char>) -> bool {
    before.is_some_and(is_word_char) != after.is_some_and(is_word_char)
}

impl Inst {
    /// Test a consuming instruction against one character.
    ///
    /// Returns `false` for instructions that do not consume input.
    pub fn accepts(&self, ch: char) -> bool {
        match self {
            Inst::Char(expected) => ch == *expected,
            Inst::Class(class) => class.matches(ch),
            Inst::Any => true,
            Inst::AnyExceptNewline => ch != '\n',
            _ => false,
        }
    }
}

/// Compiled program.
#[derive(Debug, Clone)]
pub struct Program {
    insts: Vec<Inst>,
    group_names: Vec<Option<String>>,
    /// If every match must start with a specific literal character, store it here.
    /// Used by the VM to skip starting positions that can't possibly match.
    first_char: Option<char>,
    /// Whether every match must start at the beginning of the text.
    anchored_start: bool,
}

impl Program {
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Number of capture slots, two per group including the whole match.
    pub fn slot_count(&self) -> usize {
        self.group_names.len() * 2
    }

    /// Number of groups including group 0.
    pub fn group_count(&self) -> usize {
        self.group_names.len()
    }

    pub fn group_names(&self) -> &[Option<String>] {
        &self.group_names
    }

    /// Look up a named group's id.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.group_names
            .iter()
            .position(|group| group.as_deref() == Some(name))
    }

    pub fn first_char(&self) -> Option<char> {
        self.first_char
    }

    pub fn anchored_start(&self) -> bool {
        self.anchored_start
    }
}

/// Target used for forward references until the fragment end is known.
const HOLE: usize = usize::MAX;

struct Compiler {
    insts: Vec<Inst>,
    flags: Flags,
    limits: CompileLimits,
}

/// Compile an AST into an NFA program.
pub fn compile(ast: &Ast, flags: Flags, limits: CompileLimits) -> Result<Program, CompileError> {
    let mut compiler = Compiler {
        insts: Vec::new(),
        flags,
        limits,
    };
    compiler.push(Inst::Save(0))?;
    compiler.emit(&ast.root)?;
    compiler.push(Inst::Save(1))?;
    compiler.push(Inst::Match)?;

    let insts = compiler.insts;
    let first_char = extract_first_char(&insts);
    let anchored_start = matches!(first_required(&insts), Some(Inst::Assert(Look::TextStart)));
    debug!(
        "compiled {} groups into {} instructions (first char: {:?}, anchored: {})",
        ast.group_count(),
        insts.len(),
        first_char,
        anchored_start,
    );
    Ok(Program {
        insts,
        group_names: ast.group_names.clone(),
        first_char,
        anchored_start,
    })
}

/// The first instruction every path must execute, skipping capture saves.
fn first_required(insts: &[Inst]) -> Option<&Inst> {
    insts.iter().find(|inst| !matches!(inst, Inst::Save(_)))
}

/// Extract the first required literal character from the instruction stream, if any.
fn extract_first_char(insts: &[Inst]) -> Option<char> {
    match first_required(insts)? {
        Inst::Char(ch) => Some(*ch),
        _ => None,
    }
}

impl Compiler {
    fn push(&mut self, inst: Inst) -> Result<usize, CompileError> {
        if self.insts.len() >= self.limits.max_instructions {
            return Err(CompileError::ProgramTooLarge {
                limit: self.limits.max_instructions,
            });
        }
        self.insts.push(inst);
        Ok(self.insts.len() - 1)
    }

    fn pc(&self) -> usize {
        self.insts.len()
    }

    /// Point a placeholder `Split` or `Jump` at its targets.
    fn patch(&mut self, pc: usize, inst: Inst) {
        self.insts[pc] = inst;
    }

    fn split(preferred: usize, other: usize, greedy: bool) -> Inst {
        if greedy {
            Inst::Split(preferred, other)
        } else {
            Inst::Split(other, preferred)
        }
    }

    fn emit(&mut self, node: &AstNode) -> Result<(), CompileError> {
        match node {
            AstNode::Literal(ch) => {
                let inst = if self.flags.case_insensitive && case_variants(*ch).iter().any(|c| c != ch) {
                    Inst::Class(CharClass::folded_literal(*ch))
                } else {
                    Inst::Char(*ch)
                };
                self.push(inst)?;
            }
            AstNode::Dot => {
                self.push(if self.flags.dotall { Inst::Any } else { Inst::AnyExceptNewline })?;
            }
            AstNode::Concat(nodes) => {
                for n in nodes {
                    self.emit(n)?;
                }
            }
            AstNode::Alternation(branches) => self.emit_alternation(branches)?,
            AstNode::Repetition {
                node: sub,
                min,
                max,
                greedy,
            } => self.emit_repetition(sub, *min, *max, *greedy)?,
            AstNode::CharClass { items, negated } => {
                let class = CharClass::new(items.clone(), *negated, self.flags.case_insensitive);
                self.push(Inst::Class(class))?;
            }
            AstNode::ShorthandClass(kind) => {
                let class = CharClass::new(vec![ClassItem::Shorthand(*kind)], false, false);
                self.push(Inst::Class(class))?;
            }
            AstNode::Anchor(kind) => {
                let look = match kind {
                    AnchorKind::Start if self.flags.multiline => Look::LineStart,
                    AnchorKind::End if self.flags.multiline => Look::LineEnd,
                    AnchorKind::Start | AnchorKind::TextStart => Look::TextStart,
                    AnchorKind::End | AnchorKind::TextEnd => Look::TextEnd,
                    AnchorKind::WordBoundary => Look::WordBoundary,
                    AnchorKind::NonWordBoundary => Look::NonWordBoundary,
                };
                self.push(Inst::Assert(look))?;
            }
            AstNode::Group {
                node: sub,
                index: Some(index),
                ..
            } => {
                self.push(Inst::Save(index * 2))?;
                self.emit(sub)?;
                self.push(Inst::Save(index * 2 + 1))?;
            }
            AstNode::Group {
                node: sub,
                index: None,
                ..
            } => self.emit(sub)?,
        }
        Ok(())
    }

    fn emit_alternation(&mut self, branches: &[AstNode]) -> Result<(), CompileError> {
        // a|b|c compiles to:
        //   split L1, L2
        //   L1: <a> jump END
        //   L2: split L3, L4
        //   L3: <b> jump END
        //   L4: <c>
        //   END:
        let Some((last, rest)) = branches.split_last() else {
            return Ok(());
        };
        let mut fixup_jumps = Vec::with_capacity(rest.len());
        for branch in rest {
            let split_pc = self.push(Inst::Jump(HOLE))?;
            let branch_start = self.pc();
            self.emit(branch)?;
            fixup_jumps.push(self.push(Inst::Jump(HOLE))?);
            let next_branch = self.pc();
            self.patch(split_pc, Inst::Split(branch_start, next_branch));
        }
        self.emit(last)?;
        let end = self.pc();
        for jpc in fixup_jumps {
            self.patch(jpc, Inst::Jump(end));
        }
        Ok(())
    }

    fn emit_repetition(
        &mut self,
        sub: &AstNode,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    ) -> Result<(), CompileError> {
        let limit = self.limits.max_repetition;
        let count = max.unwrap_or(min);
        if count > limit || min > limit {
            return Err(CompileError::RepetitionTooLarge {
                count: count.max(min),
                limit,
            });
        }

        match max {
            None if min == 0 => self.emit_star(sub, greedy),
            None => {
                for _ in 1..min {
                    self.emit(sub)?;
                }
                // L1: <sub>
                //     split L1, L2  (greedy: prefer L1)
                // L2:
                let l1 = self.pc();
                self.emit(sub)?;
                let l2 = self.pc() + 1;
                self.push(Self::split(l1, l2, greedy))?;
                Ok(())
            }
            Some(max) => {
                for _ in 0..min {
                    self.emit(sub)?;
                }
                // Optional copies nest, so `x{0,3}` is `(x(x(x)?)?)?`:
                //   split L1, END
                //   L1: <sub> split L2, END
                //   L2: <sub> ...
                //   END:
                let mut splits = Vec::with_capacity((max - min) as usize);
                for _ in min..max {
                    splits.push(self.push(Inst::Jump(HOLE))?);
                    self.emit(sub)?;
                }
                let end = self.pc();
                for split_pc in splits {
                    self.patch(split_pc, Self::split(split_pc + 1, end, greedy));
                }
                Ok(())
            }
        }
    }

    fn emit_star(&mut self, sub: &AstNode, greedy: bool) -> Result<(), CompileError> {
        // L1: split L2, L3  (greedy: prefer L2)
        // L2: <sub> loop L1, L3
        // L3:
        let l1 = self.push(Inst::Jump(HOLE))?;
        let l2 = self.pc();
        self.emit(sub)?;
        let l3 = self.pc() + 1;
        self.push(Inst::Loop { head: l1, exit: l3 })?;
        self.patch(l1, Self::split(l2, l3, greedy));
        Ok(())
    }
}

impl fmt::Display for Look {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Look::TextStart => "text-start",
            Look::TextEnd => "text-end",
            Look::LineStart => "line-start",
            Look::LineEnd => "line-end",
            Look::WordBoundary => "word-boundary",
            Look::NonWordBoundary => "not-word-boundary",
        })
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Char(ch) => write!(f, "char {}", ch.escape_debug()),
            Inst::Class(class) => write!(f, "class {class}"),
            Inst::Any => f.write_str("any"),
            Inst::AnyExceptNewline => f.write_str("any-except-newline"),
            Inst::Split(first, second) => write!(f, "split {first}, {second}"),
            Inst::Jump(target) => write!(f, "jump {target}"),
            Inst::Loop { head, exit } => write!(f, "loop {head}, {exit}"),
            Inst::Save(slot) => write!(f, "save {slot}"),
            Inst::Assert(look) => write!(f, "assert {look}"),
            Inst::Match => f.write_str("match"),
        }
    }
}

/// Numbered program listing, one instruction per line.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, inst) in self.insts.iter().enumerate() {
            writeln!(f, "{pc:4}: {inst}")?;
        }
        Ok(())
    }
}
