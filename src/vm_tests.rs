//! Pike VM tests: priority, termination and work bounds.

use pretty_assertions::assert_eq;

use crate::captures::{Span, project};
use crate::compiler::{Program, compile};
use crate::config::{CompileLimits, ExecLimits, Flags};
use crate::error::Error;
use crate::parser::parse;
use crate::vm::{Budget, Unlimited, search};

fn program(pattern: &str) -> Program {
    let ast = parse(pattern).expect("pattern should parse");
    compile(&ast, Flags::default(), CompileLimits::default()).expect("pattern should compile")
}

/// Runs a search and returns every group's spans.
fn run(pattern: &str, haystack: &str) -> Option<Vec<Vec<Span>>> {
    run_at(pattern, haystack, 0, false)
}

fn run_at(pattern: &str, haystack: &str, start: usize, anchored: bool) -> Option<Vec<Vec<Span>>> {
    let program = program(pattern);
    let Ok(accepted) = search(&program, haystack, start, anchored, &mut Unlimited);
    accepted.map(|accepted| project(&accepted.history, accepted.tip, program.group_count()))
}

fn whole(pattern: &str, haystack: &str) -> Option<Span> {
    run(pattern, haystack).map(|groups| groups[0][0])
}

/// Records the largest step count reported during a search.
#[derive(Default)]
struct StepCounter {
    steps: u64,
}

impl Budget for StepCounter {
    type Error = std::convert::Infallible;

    fn check(&mut self, steps: u64, _history: usize) -> Result<(), Self::Error> {
        self.steps = self.steps.max(steps);
        Ok(())
    }
}

#[test]
fn leftmost_start_wins() {
    assert_eq!(whole("b+", "aabbb"), Some(Span::new(2, 5)));
    assert_eq!(whole("x", "abc"), None);
    assert_eq!(whole("", "abc"), Some(Span::new(0, 0)));
}

#[test]
fn first_alternative_wins_over_longer() {
    assert_eq!(whole("a|ab", "ab"), Some(Span::new(0, 1)));
    assert_eq!(whole("ab|a", "ab"), Some(Span::new(0, 2)));
}

#[test]
fn greedy_and_lazy() {
    assert_eq!(whole("a+", "aaa"), Some(Span::new(0, 3)));
    assert_eq!(whole("a+?", "aaa"), Some(Span::new(0, 1)));
    assert_eq!(whole("a*?b", "aaab"), Some(Span::new(0, 4)));
}

#[test]
fn nullable_loops_terminate() {
    assert_eq!(whole("(a*)*", "aaa"), Some(Span::new(0, 3)));
    assert_eq!(whole("(a?)*b", "aab"), Some(Span::new(0, 3)));
    assert_eq!(whole("(|a)+", "aa"), Some(Span::new(0, 0)));
    assert_eq!(whole("(a*)+$", "b"), Some(Span::new(1, 1)));
}

#[test]
fn empty_iteration_leaves_loop_with_its_captures() {
    assert_eq!(run("(a*)*b", "b").unwrap()[1], vec![Span::new(0, 0)]);
    assert_eq!(run("(a?)*", "").unwrap()[1], vec![Span::new(0, 0)]);
    assert_eq!(run("x(y|)*z", "xz").unwrap()[1], vec![Span::new(1, 1)]);

    // A lazy loop prefers not to iterate at all.
    assert!(run("(a?)*?", "").unwrap()[1].is_empty());

    // No empty iteration is recorded after a real one.
    assert_eq!(
        run("(a?)*", "aa").unwrap()[1],
        vec![Span::new(0, 1), Span::new(1, 2)]
    );
}

#[test]
fn repeated_group_keeps_every_iteration() {
    let groups = run(r"(\w)+", "abc").unwrap();
    assert_eq!(
        groups[1],
        vec![Span::new(0, 1), Span::new(1, 2), Span::new(2, 3)]
    );
}

#[test]
fn anchored_search_only_tries_start() {
    assert_eq!(run_at("b", "ab", 0, true), None);
    assert_eq!(
        run_at("b", "ab", 1, true).map(|groups| groups[0][0]),
        Some(Span::new(1, 2))
    );
}

#[test]
fn start_offset() {
    assert_eq!(
        run_at("a", "aXa", 1, false).map(|groups| groups[0][0]),
        Some(Span::new(2, 3))
    );
    assert_eq!(run_at("^a", "aa", 1, false), None);
    assert_eq!(run_at("a", "a", 5, false), None);
}

#[test]
fn first_char_skip_keeps_results() {
    // `q` occurs late; skipping ahead must not lose the match or its groups.
    let groups = run("q(u+)", "aaaaqaaquu").unwrap();
    assert_eq!(groups[0], vec![Span::new(7, 10)]);
    assert_eq!(groups[1], vec![Span::new(8, 10)]);
}

#[test]
fn assertions() {
    assert_eq!(whole(r"\bcat\b", "concat cat"), Some(Span::new(7, 10)));
    assert_eq!(whole(r"\Bcat", "concat cat"), Some(Span::new(3, 6)));
    assert_eq!(whole("a$", "a\n"), None);
    assert_eq!(whole(r"a\z", "ba"), Some(Span::new(1, 2)));
}

#[test]
fn multibyte_offsets() {
    let groups = run("(.)(.)", "éa").unwrap();
    assert_eq!(groups[1], vec![Span::new(0, 2)]);
    assert_eq!(groups[2], vec![Span::new(2, 3)]);
}

#[test]
fn work_is_bounded_by_program_size_times_input() {
    let program = program("(x+x+)+y");
    let haystack = "x".repeat(2_000);
    let mut counter = StepCounter::default();
    let Ok(accepted) = search(&program, &haystack, 0, false, &mut counter);
    assert!(accepted.is_none());

    // Each position runs at most one closure generation per list plus one
    // visit per live path.
    let bound = 2 * program.len() as u64 * (haystack.len() as u64 + 1);
    assert!(
        counter.steps <= bound,
        "{} steps exceeds bound {}",
        counter.steps,
        bound
    );
}

#[test]
fn exec_limits() {
    let program = program("(a|b)*c");
    let haystack = "ab".repeat(100);

    let mut limits = ExecLimits::new().max_steps(50);
    let result = search(&program, &haystack, 0, false, &mut limits);
    assert!(matches!(result, Err(Error::ExecutionLimitExceeded { .. })));

    let mut limits = ExecLimits::new().max_history(10);
    let result = search(&program, &haystack, 0, false, &mut limits);
    assert!(matches!(result, Err(Error::ExecutionLimitExceeded { .. })));

    let mut generous = ExecLimits::new().max_steps(1_000_000);
    assert!(matches!(search(&program, &haystack, 0, false, &mut generous), Ok(None)));
}
