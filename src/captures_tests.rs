//! Projection of capture histories into per-group spans.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::captures::{Match, Span, project};
use crate::history::{Boundary, HistoryArena, Tip};

/// A whole match over `ab,cd` in which group 1 captured twice.
fn sample(arena: &mut HistoryArena) -> Tip {
    let tip = arena.extend(Tip::EMPTY, 0, 0, Boundary::Start);
    let tip = arena.extend(tip, 1, 0, Boundary::Start);
    let tip = arena.extend(tip, 1, 2, Boundary::End);
    let tip = arena.extend(tip, 1, 3, Boundary::Start);
    let tip = arena.extend(tip, 1, 5, Boundary::End);
    arena.extend(tip, 0, 5, Boundary::End)
}

#[test]
fn walk_is_newest_first() {
    let mut arena = HistoryArena::new();
    let tip = sample(&mut arena);
    let offsets: Vec<usize> = arena.walk(tip).map(|node| node.offset).collect();
    assert_eq!(offsets, vec![5, 5, 3, 2, 0, 0]);
    assert_eq!(arena.walk(Tip::EMPTY).count(), 0);
}

#[test]
fn forks_share_history() {
    let mut arena = HistoryArena::new();
    let base = arena.extend(Tip::EMPTY, 1, 0, Boundary::Start);
    let left = arena.extend(base, 1, 1, Boundary::End);
    let right = arena.extend(base, 1, 4, Boundary::End);

    assert_eq!(arena.len(), 3);
    assert_eq!(project(&arena, left, 2)[1], vec![Span::new(0, 1)]);
    assert_eq!(project(&arena, right, 2)[1], vec![Span::new(0, 4)]);
}

#[test]
fn projection_restores_chronological_order() {
    let mut arena = HistoryArena::new();
    let tip = sample(&mut arena);
    assert_eq!(
        project(&arena, tip, 3),
        vec![
            vec![Span::new(0, 5)],
            vec![Span::new(0, 2), Span::new(3, 5)],
            vec![],
        ]
    );
}

#[test]
fn match_accessors() {
    let mut arena = HistoryArena::new();
    let tip = sample(&mut arena);
    let names: Arc<[Option<String>]> = vec![None, Some("word".to_owned()), None].into();
    let found = Match::from_history("ab,cd", &arena, tip, names).unwrap();

    assert_eq!(found.as_str(), "ab,cd");
    assert_eq!(found.range(), 0..5);
    assert_eq!(found.group_len(), 3);
    assert_eq!(found.get(1), Some("cd"));
    assert_eq!(found.get_all(1), vec!["ab", "cd"]);
    assert_eq!(found.name("word"), Some("cd"));
    assert_eq!(found.get_all_named("word"), vec!["ab", "cd"]);
    assert_eq!(found.span(2), None);
    assert_eq!(found.get_all(2), Vec::<&str>::new());
    assert!(found.spans(7).is_empty());
    assert_eq!(found.name("missing"), None);
}

#[test]
fn match_requires_whole_span() {
    let arena = HistoryArena::new();
    let names: Arc<[Option<String>]> = vec![None].into();
    assert_eq!(Match::from_history("", &arena, Tip::EMPTY, names), None);
}

/// `ab,cd` matched by `((\w)+),?` repeated, so group 2 nests in group 1.
fn nested(arena: &mut HistoryArena) -> Tip {
    let events = [
        (0, 0, Boundary::Start),
        (1, 0, Boundary::Start),
        (2, 0, Boundary::Start),
        (2, 1, Boundary::End),
        (2, 1, Boundary::Start),
        (2, 2, Boundary::End),
        (1, 2, Boundary::End),
        (1, 3, Boundary::Start),
        (2, 3, Boundary::Start),
        (2, 4, Boundary::End),
        (2, 4, Boundary::Start),
        (2, 5, Boundary::End),
        (1, 5, Boundary::End),
        (0, 5, Boundary::End),
    ];
    events
        .into_iter()
        .fold(Tip::EMPTY, |tip, (group, offset, boundary)| {
            arena.extend(tip, group, offset, boundary)
        })
}

#[test]
fn sub_matches_are_scoped_to_their_capture() {
    let mut arena = HistoryArena::new();
    let tip = nested(&mut arena);
    let names: Arc<[Option<String>]> = vec![None, None, None].into();
    let found = Match::from_history("ab,cd", &arena, tip, names).unwrap();

    assert_eq!(found.group(), 0);
    assert_eq!(found.get_all(2), vec!["a", "b", "c", "d"]);
    assert_eq!(found.sub_matches(0).count(), 0);

    let records: Vec<Match<'_>> = found.sub_matches(1).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].group(), 1);
    assert_eq!(records[0].range(), 0..2);
    assert_eq!(records[0].get_all(2), vec!["a", "b"]);
    assert_eq!(records[1].get_all(2), vec!["c", "d"]);
    assert_eq!(records[1].get(1), Some("cd"));
    assert_eq!(records[1].span(0), None);

    let children: Vec<&str> = found.children().iter().map(|m| m.as_str()).collect();
    assert_eq!(children, vec!["ab", "cd"]);
    let letters: Vec<usize> = records[0].children().iter().map(|m| m.group()).collect();
    assert_eq!(letters, vec![2, 2]);
}

#[test]
fn unclosed_capture_is_not_reported() {
    let mut arena = HistoryArena::new();
    let tip = arena.extend(Tip::EMPTY, 1, 0, Boundary::Start);
    let tip = arena.extend(tip, 1, 3, Boundary::Start);
    let tip = arena.extend(tip, 1, 5, Boundary::End);
    assert_eq!(project(&arena, tip, 2)[1], vec![Span::new(3, 5)]);
}
