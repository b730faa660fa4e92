use std::cell::RefCell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use gloo::timers::callback::Timeout;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::spawn_local;

use tsunagari_core::evaluate::{evaluate, Evaluation};
use tsunagari_core::puzzle::Puzzle;
use tsunagari_core::run::RunState;
use tsunagari_core::shuffle::shuffle;
use tsunagari_core::snapshot::RunSnapshot;

use crate::clock::{fresh_seed, now_ms};
use crate::store::{DocumentStore, IdentityProvider, LocalStore};
use crate::RunStore;

pub const SAVE_DEBOUNCE_MS: u32 = 250;

/// One play session: a canonical puzzle bound to its run state and the
/// persistence coordinator. Every mutation drops a snapshot into a pending
/// slot; on wasm32 a re-armed trailing-edge timer writes it out after the
/// burst settles, so drag-selects cost one write, not one per event. The
/// final state of a burst is what persists.
pub struct GameSession<D, L, I> {
    puzzle: Puzzle,
    run: RunState,
    store: Rc<RunStore<D, L, I>>,
    // Drives the wasm timer; native callers flush explicitly.
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    debounce_ms: u32,
    pending: Rc<RefCell<Option<RunSnapshot>>>,
    #[cfg(target_arch = "wasm32")]
    save_timer: Option<Timeout>,
}

impl<D, L, I> GameSession<D, L, I>
where
    D: DocumentStore + 'static,
    L: LocalStore + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(puzzle: Puzzle, author: &str, store: Rc<RunStore<D, L, I>>) -> Self {
        let run = RunState::new(&puzzle.title, author);
        Self {
            puzzle,
            run,
            store,
            debounce_ms: SAVE_DEBOUNCE_MS,
            pending: Rc::new(RefCell::new(None)),
            #[cfg(target_arch = "wasm32")]
            save_timer: None,
        }
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u32) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    /// Applies the persisted snapshot, if any. Awaited once at session
    /// start; a snapshot arriving from the cloud replaces whatever local
    /// defaults were in place.
    pub async fn hydrate(&mut self) {
        let Some(snapshot) = self.store.load(&self.puzzle.id).await else {
            return;
        };
        let mut run = snapshot.run;
        if run.title.is_empty() {
            run.title = self.run.title.clone();
        }
        if run.author.is_empty() {
            run.author = self.run.author.clone();
        }
        self.run = run;
    }

    /// Word ids in display order. The first layout draws a fresh seed and
    /// captures it into the run, so a resumed session reconstructs the
    /// identical arrangement.
    pub fn board_order(&mut self) -> Vec<String> {
        let seed = match self.run.seed {
            Some(seed) => seed,
            None => {
                let seed = fresh_seed();
                self.run.seed = Some(seed);
                self.schedule_save();
                seed
            }
        };
        let ids: Vec<String> = self.puzzle.words.iter().map(|word| word.id.clone()).collect();
        shuffle(&ids, seed)
    }

    pub fn select(&mut self, id: &str) -> bool {
        let changed = self.run.select(id, self.puzzle.group_size);
        if changed {
            self.schedule_save();
        }
        changed
    }

    pub fn deselect(&mut self, id: &str) {
        self.run.deselect(id);
        self.schedule_save();
    }

    pub fn clear_selection(&mut self) {
        self.run.clear_selection();
        self.schedule_save();
    }

    /// Evaluates the current selection as a guess and records the outcome.
    /// An empty selection is a no-op rather than a wasted move.
    pub fn submit_selection(&mut self) -> Evaluation {
        if self.run.selected_ids.is_empty() {
            return Evaluation::NoMatch;
        }
        let selection = self.run.selected_ids.clone();
        let result = evaluate(&self.puzzle, &selection);
        self.run
            .record_guess(&selection, result.is_match(), self.puzzle.grid_count);
        self.schedule_save();
        result
    }

    /// Back to a fresh run, locally and in the stores. Discards any pending
    /// debounced write first so it cannot land after the clear.
    pub async fn reset(&mut self) {
        self.cancel_timer();
        self.pending.borrow_mut().take();
        self.run.reset();
        self.store.clear(&self.puzzle.id).await;
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Writes the pending snapshot immediately. Native callers persist
    /// through this; browser sessions use it on page-hide, ahead of the
    /// debounce timer.
    pub async fn flush(&mut self) {
        self.cancel_timer();
        let snapshot = self.pending.borrow_mut().take();
        if let Some(snapshot) = snapshot {
            self.store.save(&self.puzzle.id, &snapshot).await;
        }
    }

    fn schedule_save(&mut self) {
        let snapshot = RunSnapshot::new(self.run.clone(), now_ms());
        *self.pending.borrow_mut() = Some(snapshot);
        #[cfg(target_arch = "wasm32")]
        {
            let pending = self.pending.clone();
            let store = self.store.clone();
            let puzzle_id = self.puzzle.id.clone();
            let timer = Timeout::new(self.debounce_ms, move || {
                let Some(snapshot) = pending.borrow_mut().take() else {
                    return;
                };
                spawn_local(async move {
                    store.save(&puzzle_id, &snapshot).await;
                });
            });
            if let Some(previous) = self.save_timer.replace(timer) {
                previous.cancel();
            }
        }
    }

    fn cancel_timer(&mut self) {
        #[cfg(target_arch = "wasm32")]
        if let Some(timer) = self.save_timer.take() {
            timer.cancel();
        }
    }
}
