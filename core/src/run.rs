use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Fresh,
    InProgress,
    Completed,
}

/// One player's session on one puzzle. Carries exactly the fields that get
/// persisted, so a snapshot is the state verbatim plus a timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub title: String,
    pub author: String,
    pub moves: u32,
    pub completed: bool,
    pub selected_ids: Vec<String>,
    pub found_ids: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

impl RunState {
    pub fn new(title: &str, author: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> RunPhase {
        if self.completed {
            RunPhase::Completed
        } else if self.moves > 0 || !self.found_ids.is_empty() {
            RunPhase::InProgress
        } else {
            RunPhase::Fresh
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.iter().any(|selected| selected == id)
    }

    pub fn is_found(&self, id: &str) -> bool {
        self.found_ids
            .iter()
            .any(|group| group.iter().any(|found| found == id))
    }

    /// Adds `id` to the highlighted selection. Refused (returns false) when
    /// the selection is already `group_size` wide, the id is already
    /// selected, or the id belongs to a solved group.
    pub fn select(&mut self, id: &str, group_size: usize) -> bool {
        if self.selected_ids.len() >= group_size || self.is_selected(id) || self.is_found(id) {
            return false;
        }
        self.selected_ids.push(id.to_string());
        true
    }

    pub fn deselect(&mut self, id: &str) {
        self.selected_ids.retain(|selected| selected != id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_ids.clear();
    }

    /// Records one evaluated guess. Moves count up whether or not the guess
    /// was correct; a correct guess appends its group to `found_ids` in
    /// solve order (once) and may complete the run. The selection is
    /// cleared either way.
    pub fn record_guess(&mut self, ids: &[String], correct: bool, grid_count: usize) {
        self.moves = self.moves.saturating_add(1);
        if correct && !ids.is_empty() && !ids.iter().any(|id| self.is_found(id)) {
            self.found_ids.push(ids.to_vec());
        }
        self.selected_ids.clear();
        if self.found_ids.len() == grid_count {
            self.completed = true;
        }
    }

    /// Soft reset back to `Fresh`: clears progress but keeps the display
    /// metadata. Clearing the persisted record is the store's job.
    pub fn reset(&mut self) {
        self.moves = 0;
        self.completed = false;
        self.selected_ids.clear();
        self.found_ids.clear();
        self.seed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|id| (*id).to_string()).collect()
    }

    #[test]
    fn fresh_until_first_guess() {
        let mut run = RunState::new("Demo", "jane");
        assert_eq!(run.phase(), RunPhase::Fresh);
        run.select("A1", 4);
        assert_eq!(run.phase(), RunPhase::Fresh);
        run.record_guess(&ids(&["A1", "A2", "A3", "B1"]), false, 4);
        assert_eq!(run.phase(), RunPhase::InProgress);
        assert_eq!(run.moves, 1);
        assert!(run.found_ids.is_empty());
        assert!(run.selected_ids.is_empty());
    }

    #[test]
    fn selection_capped_at_group_size() {
        let mut run = RunState::default();
        assert!(run.select("A1", 2));
        assert!(run.select("A2", 2));
        assert!(!run.select("B1", 2));
        assert!(!run.select("A1", 2));
        run.deselect("A1");
        assert!(run.select("B1", 2));
        assert_eq!(run.selected_ids, ids(&["A2", "B1"]));
    }

    #[test]
    fn found_words_cannot_be_reselected() {
        let mut run = RunState::default();
        run.record_guess(&ids(&["A1", "A2"]), true, 4);
        assert!(!run.select("A1", 2));
        assert!(run.select("B1", 2));
    }

    #[test]
    fn solve_order_is_preserved() {
        let mut run = RunState::default();
        run.record_guess(&ids(&["C1", "C2"]), true, 3);
        run.record_guess(&ids(&["A1", "A2"]), true, 3);
        assert_eq!(run.found_ids, vec![ids(&["C1", "C2"]), ids(&["A1", "A2"])]);
        assert_eq!(run.phase(), RunPhase::InProgress);
    }

    #[test]
    fn completes_when_all_groups_found() {
        let mut run = RunState::default();
        run.record_guess(&ids(&["A1", "A2"]), true, 2);
        run.record_guess(&ids(&["B1", "B2"]), true, 2);
        assert!(run.completed);
        assert_eq!(run.phase(), RunPhase::Completed);
        assert_eq!(run.moves, 2);
    }

    #[test]
    fn duplicate_group_is_not_recorded_twice() {
        let mut run = RunState::default();
        run.record_guess(&ids(&["A1", "A2"]), true, 2);
        run.record_guess(&ids(&["A1", "A2"]), true, 2);
        assert_eq!(run.found_ids.len(), 1);
        assert_eq!(run.moves, 2);
        assert!(!run.completed);
    }

    #[test]
    fn reset_preserves_metadata() {
        let mut run = RunState::new("Demo", "jane");
        run.seed = Some(99);
        run.record_guess(&ids(&["A1", "A2"]), true, 2);
        run.record_guess(&ids(&["B1", "B2"]), true, 2);
        run.reset();
        assert_eq!(run.phase(), RunPhase::Fresh);
        assert_eq!(run.title, "Demo");
        assert_eq!(run.author, "jane");
        assert_eq!(run.moves, 0);
        assert!(!run.completed);
        assert!(run.found_ids.is_empty());
        assert_eq!(run.seed, None);
    }
}
