use rand::seq::SliceRandom;
use rand::Rng;

use tsunagari::{DocumentStore, GameSession, IdentityProvider, LocalStore};
use tsunagari_core::puzzle::{GroupId, Puzzle};
use tsunagari_core::run::RunState;

pub struct BotReport {
    pub moves: u32,
    pub completed: bool,
}

/// Picks the next guess. With probability `skill` the bot names a whole
/// unsolved group; otherwise it grabs `group_size` random unfound words,
/// which is how humans burn moves.
pub fn plan_guess<R: Rng>(
    puzzle: &Puzzle,
    run: &RunState,
    skill: f64,
    rng: &mut R,
) -> Vec<String> {
    let unsolved: Vec<GroupId> = puzzle
        .categories
        .iter()
        .enumerate()
        .filter_map(|(gi, _)| GroupId::from_index(gi))
        .filter(|group_id| {
            puzzle
                .group_members(*group_id)
                .all(|word| !run.is_found(&word.id))
        })
        .collect();
    if let Some(group_id) = unsolved.choose(rng) {
        if rng.gen_bool(skill.clamp(0.0, 1.0)) {
            return puzzle
                .group_members(*group_id)
                .map(|word| word.id.clone())
                .collect();
        }
    }
    let mut remaining: Vec<String> = puzzle
        .words
        .iter()
        .filter(|word| !run.is_found(&word.id))
        .map(|word| word.id.clone())
        .collect();
    remaining.shuffle(rng);
    remaining.truncate(puzzle.group_size);
    remaining
}

pub async fn run_bot<D, L, I, R>(
    session: &mut GameSession<D, L, I>,
    max_moves: u32,
    skill: f64,
    rng: &mut R,
) -> BotReport
where
    D: DocumentStore + 'static,
    L: LocalStore + 'static,
    I: IdentityProvider + 'static,
    R: Rng,
{
    let mut guesses = 0;
    while !session.run().completed && guesses < max_moves {
        let guess = plan_guess(session.puzzle(), session.run(), skill, rng);
        if guess.len() != session.puzzle().group_size {
            break;
        }
        session.clear_selection();
        for id in &guess {
            session.select(id);
        }
        session.submit_selection();
        guesses += 1;
    }
    session.flush().await;
    BotReport {
        moves: session.run().moves,
        completed: session.run().completed,
    }
}
