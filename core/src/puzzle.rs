use std::fmt;

pub const GROUP_SIZE_MIN: usize = 2;
pub const GROUP_SIZE_MAX: usize = 10;
pub const GRID_COUNT_MIN: usize = 2;
pub const GRID_COUNT_MAX: usize = 10;

pub const GROUP_LABELS: &str = "ABCDEFGHIJ";

/// Single-letter group label, `A` through `J`, assigned by category position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(char);

impl GroupId {
    pub fn from_index(index: usize) -> Option<Self> {
        GROUP_LABELS.chars().nth(index).map(Self)
    }

    pub fn from_char(ch: char) -> Option<Self> {
        GROUP_LABELS.contains(ch).then_some(Self(ch))
    }

    pub fn index(&self) -> usize {
        GROUP_LABELS.chars().position(|ch| ch == self.0).unwrap_or(0)
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: String,
    pub text: String,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub title: String,
    pub words: Vec<String>,
}

/// Canonical in-memory puzzle, the only shape gameplay logic consumes.
/// Produced by `normalize` or `Puzzle::from_categories`; invariants:
/// `words.len() == group_size * grid_count`, word ids unique, one category
/// per group label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub group_size: usize,
    pub grid_count: usize,
    pub words: Vec<Word>,
    pub categories: Vec<Category>,
}

impl Puzzle {
    /// Builds a canonical puzzle from `(title, words)` category rows, with
    /// ids synthesized the same way the normalizer does (`A1`, `A2`, ...).
    /// Returns `None` when the rows are not rectangular or exceed the label
    /// alphabet.
    pub fn from_categories(
        id: &str,
        title: &str,
        description: &str,
        rows: &[(&str, &[&str])],
    ) -> Option<Self> {
        let grid_count = rows.len();
        let group_size = rows.first()?.1.len();
        let mut words = Vec::with_capacity(grid_count * group_size);
        let mut categories = Vec::with_capacity(grid_count);
        for (gi, (cat_title, cat_words)) in rows.iter().enumerate() {
            if cat_words.len() != group_size {
                return None;
            }
            let group_id = GroupId::from_index(gi)?;
            for (wi, text) in cat_words.iter().enumerate() {
                words.push(Word {
                    id: format!("{group_id}{}", wi + 1),
                    text: (*text).to_string(),
                    group_id,
                });
            }
            categories.push(Category {
                title: (*cat_title).to_string(),
                words: cat_words.iter().map(|w| (*w).to_string()).collect(),
            });
        }
        Some(Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            group_size,
            grid_count,
            words,
            categories,
        })
    }

    pub fn word(&self, id: &str) -> Option<&Word> {
        self.words.iter().find(|word| word.id == id)
    }

    pub fn group_members(&self, group_id: GroupId) -> impl Iterator<Item = &Word> {
        self.words.iter().filter(move |word| word.group_id == group_id)
    }

    pub fn category_title(&self, group_id: GroupId) -> Option<&str> {
        self.categories
            .get(group_id.index())
            .map(|category| category.title.as_str())
    }

    pub fn word_count(&self) -> usize {
        self.group_size * self.grid_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_ids_follow_label_alphabet() {
        assert_eq!(GroupId::from_index(0).map(|g| g.as_char()), Some('A'));
        assert_eq!(GroupId::from_index(9).map(|g| g.as_char()), Some('J'));
        assert_eq!(GroupId::from_index(10), None);
        assert_eq!(GroupId::from_char('C').map(|g| g.index()), Some(2));
        assert_eq!(GroupId::from_char('z'), None);
    }

    #[test]
    fn from_categories_synthesizes_positional_ids() {
        let puzzle = Puzzle::from_categories(
            "p",
            "t",
            "",
            &[("One", &["a", "b"]), ("Two", &["c", "d"])],
        )
        .expect("build puzzle");
        assert_eq!(puzzle.grid_count, 2);
        assert_eq!(puzzle.group_size, 2);
        let ids: Vec<&str> = puzzle.words.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["A1", "A2", "B1", "B2"]);
        assert_eq!(puzzle.word("B2").map(|w| w.text.as_str()), Some("d"));
        assert_eq!(
            puzzle.category_title(GroupId::from_char('B').expect("label")),
            Some("Two")
        );
    }

    #[test]
    fn from_categories_rejects_ragged_rows() {
        let ragged = Puzzle::from_categories("p", "t", "", &[("One", &["a", "b"]), ("Two", &["c"])]);
        assert_eq!(ragged, None);
    }
}
