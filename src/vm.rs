/// Pike VM: runs a compiled program against an input string.
///
/// All candidate paths advance in lockstep over the input, one character
/// per step. Each step keeps at most one path per instruction, so a search
/// does `O(program size × (input length + 1))` work whatever the pattern.
/// Paths are kept in priority order; the first one to reach `Match` wins
/// and every lower-priority path is dropped.
use std::convert::Infallible;
use std::mem;

use log::{Level, debug, log_enabled, trace};

use crate::compiler::{Inst, Program};
use crate::config::ExecLimits;
use crate::error::Error;
use crate::history::{Boundary, HistoryArena, Tip};

/// Work accounting for a search, checked once per input position.
pub trait Budget {
    type Error;

    /// `steps` is the number of instructions visited so far and
    /// `history` the number of capture records allocated.
    fn check(&mut self, steps: u64, history: usize) -> Result<(), Self::Error>;
}

/// Budget that never runs out.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unlimited;

impl Budget for Unlimited {
    type Error = Infallible;

    #[inline]
    fn check(&mut self, _steps: u64, _history: usize) -> Result<(), Infallible> {
        Ok(())
    }
}

impl Budget for ExecLimits {
    type Error = Error;

    fn check(&mut self, steps: u64, history: usize) -> Result<(), Error> {
        let over_steps = self.max_steps.is_some_and(|max| steps > max);
        let over_history = self.max_history.is_some_and(|max| history > max);
        if over_steps || over_history {
            return Err(Error::ExecutionLimitExceeded { steps, history });
        }
        Ok(())
    }
}

/// The accepting path of a successful search.
#[derive(Debug)]
pub struct Accepted {
    /// Newest capture event of the accepting path.
    pub tip: Tip,
    /// Arena holding the accepting path's history (and that of dead paths).
    pub history: HistoryArena,
}

/// One candidate path.
#[derive(Clone, Copy, Debug)]
struct Thread {
    pc: usize,
    tip: Tip,
}

struct Vm<'p, 'h> {
    program: &'p Program,
    haystack: &'h str,
    history: HistoryArena,
    /// Generation in which each pc was last admitted to a list.
    stamps: Vec<usize>,
    stack: Vec<Thread>,
    steps: u64,
}

impl Vm<'_, '_> {
    /// Follow epsilon transitions from `start` at byte offset `at`, appending
    /// every path that reaches a consuming instruction or `Match` to `list`.
    ///
    /// A pc already admitted in `generation` is skipped: the earlier
    /// arrival had higher priority.
    fn add_thread(&mut self, list: &mut Vec<Thread>, start: Thread, at: usize, generation: usize) {
        self.stack.push(start);
        while let Some(Thread { pc, tip }) = self.stack.pop() {
            if self.stamps[pc] == generation {
                continue;
            }
            self.stamps[pc] = generation;
            self.steps += 1;

            match &self.program.insts()[pc] {
                Inst::Jump(target) => self.stack.push(Thread { pc: *target, tip }),
                Inst::Loop { head, exit } => {
                    // The head is stamped here either by this path's own
                    // empty iteration or by a path that has stamped the exit too.
                    let pc = if self.stamps[*head] == generation { *exit } else { *head };
                    self.stack.push(Thread { pc, tip });
                }
                Inst::Split(first, second) => {
                    // Pushed in reverse so `first` is explored first.
                    self.stack.push(Thread { pc: *second, tip });
                    self.stack.push(Thread { pc: *first, tip });
                }
                Inst::Save(slot) => {
                    let (group, boundary) = Boundary::from_slot(*slot);
                    let tip = self.history.extend(tip, group, at, boundary);
                    self.stack.push(Thread { pc: pc + 1, tip });
                }
                Inst::Assert(look) => {
                    if look.holds(self.haystack, at) {
                        self.stack.push(Thread { pc: pc + 1, tip });
                    }
                }
                _ => list.push(Thread { pc, tip }),
            }
        }
    }
}

/// Search `haystack` starting at byte offset `start`.
///
/// Unanchored searches seed a new lowest-priority path at every position
/// until a match is found, which makes earlier start positions win. An
/// anchored search only seeds at `start`.
pub fn search<B: Budget>(
    program: &Program,
    haystack: &str,
    start: usize,
    anchored: bool,
    budget: &mut B,
) -> Result<Option<Accepted>, B::Error> {
    if start > haystack.len() {
        return Ok(None);
    }
    let anchored = anchored || program.anchored_start();
    debug!(
        "searching {} bytes from offset {start} (anchored: {anchored})",
        haystack.len()
    );
    if log_enabled!(Level::Trace) {
        trace!("program listing:\n{program}");
    }

    let insts = program.insts();
    let mut vm = Vm {
        program,
        haystack,
        history: HistoryArena::new(),
        stamps: vec![0; insts.len()],
        stack: Vec::new(),
        steps: 0,
    };
    let mut clist: Vec<Thread> = Vec::with_capacity(insts.len());
    let mut nlist: Vec<Thread> = Vec::with_capacity(insts.len());
    let mut matched: Option<Tip> = None;
    let mut generation = 1;
    let mut at = start;

    loop {
        if matched.is_none() && (at == start || !anchored) {
            if clist.is_empty() && !anchored {
                if let Some(first) = program.first_char() {
                    match haystack[at..].find(first) {
                        Some(0) => {}
                        Some(skip) => {
                            // Stamps of the skipped positions no longer apply.
                            at += skip;
                            generation += 1;
                        }
                        None => break,
                    }
                }
            }
            let seed = Thread {
                pc: 0,
                tip: Tip::EMPTY,
            };
            vm.add_thread(&mut clist, seed, at, generation);
        }

        let next_char = haystack[at..].chars().next();
        let next_at = at + next_char.map_or(0, char::len_utf8);
        vm.steps += clist.len() as u64;
        for thread in &clist {
            let inst = &insts[thread.pc];
            if matches!(inst, Inst::Match) {
                // Lower-priority paths of this step can no longer win.
                matched = Some(thread.tip);
                break;
            }
            if let Some(ch) = next_char {
                if inst.accepts(ch) {
                    let next = Thread {
                        pc: thread.pc + 1,
                        tip: thread.tip,
                    };
                    vm.add_thread(&mut nlist, next, next_at, generation + 1);
                }
            }
        }

        trace!(
            "offset {at}: {} live paths, {} advancing, {} history records",
            clist.len(),
            nlist.len(),
            vm.history.len(),
        );
        budget.check(vm.steps, vm.history.len())?;

        if next_char.is_none() {
            break;
        }
        mem::swap(&mut clist, &mut nlist);
        nlist.clear();
        generation += 1;
        at = next_at;
        if clist.is_empty() && (matched.is_some() || anchored) {
            break;
        }
    }

    debug!(
        "search finished after {} steps, {} history records, matched: {}",
        vm.steps,
        vm.history.len(),
        matched.is_some(),
    );
    Ok(matched.map(|tip| Accepted {
        tip,
        history: vm.history,
    }))
}
