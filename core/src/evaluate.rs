use std::collections::BTreeSet;

use crate::puzzle::{GroupId, Puzzle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Match { group_id: GroupId },
    NoMatch,
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        matches!(self, Evaluation::Match { .. })
    }
}

/// Decides whether `selection` is one complete, correct group.
///
/// The selection must have exactly `group_size` entries, every id must
/// resolve to the same group, and the selected set must equal that group's
/// full membership. A selection containing an id the puzzle does not know,
/// a duplicate, or only part of a larger group never matches. Pure; never
/// fails.
pub fn evaluate(puzzle: &Puzzle, selection: &[String]) -> Evaluation {
    if selection.len() != puzzle.group_size {
        return Evaluation::NoMatch;
    }
    let mut picked: BTreeSet<&str> = BTreeSet::new();
    let mut group_id: Option<GroupId> = None;
    for id in selection {
        let Some(word) = puzzle.word(id) else {
            return Evaluation::NoMatch;
        };
        match group_id {
            None => group_id = Some(word.group_id),
            Some(current) if current != word.group_id => return Evaluation::NoMatch,
            Some(_) => {}
        }
        picked.insert(id.as_str());
    }
    let Some(group_id) = group_id else {
        return Evaluation::NoMatch;
    };
    let members: BTreeSet<&str> = puzzle
        .group_members(group_id)
        .map(|word| word.id.as_str())
        .collect();
    if picked == members {
        Evaluation::Match { group_id }
    } else {
        Evaluation::NoMatch
    }
}
