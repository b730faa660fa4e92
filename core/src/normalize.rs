use std::fmt;

use serde_json::Value;

use crate::puzzle::{
    Category, GroupId, Puzzle, Word, GRID_COUNT_MAX, GRID_COUNT_MIN, GROUP_SIZE_MAX,
    GROUP_SIZE_MIN,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// No usable word source in the document.
    MissingData,
    /// Structural validation failed; `rule` names the violated check.
    InvalidShape { rule: String },
}

impl NormalizeError {
    fn shape(rule: impl Into<String>) -> Self {
        NormalizeError::InvalidShape { rule: rule.into() }
    }
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingData => write!(f, "missing-data: no usable word source"),
            NormalizeError::InvalidShape { rule } => write!(f, "invalid-shape: {rule}"),
        }
    }
}

impl std::error::Error for NormalizeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCategory {
    pub title: String,
    pub words: Vec<String>,
}

/// Category-bucketed documents, optionally carrying the parallel
/// `wordsFlat` mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoriesForm {
    pub title: String,
    pub description: String,
    pub grid_count: Option<usize>,
    pub group_size: Option<usize>,
    pub categories: Vec<RawCategory>,
    pub words_flat: Option<Vec<String>>,
}

/// Documents with only a flat word sequence (`wordsFlat`, or a `words`
/// array of strings/word-bearing objects); groups are contiguous runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatWordsForm {
    pub title: String,
    pub description: String,
    pub grid_count: Option<usize>,
    pub group_size: Option<usize>,
    pub words: Vec<String>,
}

/// The historical tuple shape: `words` as an array of word rows, titles
/// optionally under `solution.groups`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTupleForm {
    pub title: String,
    pub description: String,
    pub rows: Vec<Vec<String>>,
    pub group_titles: Vec<String>,
}

/// The three stored puzzle shapes, decided by a discriminating presence
/// check instead of speculative field probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawForm {
    Categories(CategoriesForm),
    FlatWords(FlatWordsForm),
    LegacyTuple(LegacyTupleForm),
}

impl RawForm {
    pub fn detect(doc: &Value) -> Result<Self, NormalizeError> {
        if !doc.is_object() {
            return Err(NormalizeError::MissingData);
        }
        let title = doc
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Untitled")
            .to_string();
        let description = doc
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let grid_count = declared_size(doc, "gridSize");
        let group_size = declared_size(doc, "groupSize");

        let categories = array_like(doc.get("categories"));
        if !categories.is_empty() {
            let categories = categories
                .iter()
                .map(|entry| RawCategory {
                    title: entry
                        .get("title")
                        .or_else(|| entry.get("name"))
                        .map(coerce_text)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                    words: coerce_word_list(entry.get("words")),
                })
                .collect();
            let flat = coerce_word_list(doc.get("wordsFlat"));
            return Ok(RawForm::Categories(CategoriesForm {
                title,
                description,
                grid_count,
                group_size,
                categories,
                words_flat: (!flat.is_empty()).then_some(flat),
            }));
        }

        let flat = coerce_word_list(doc.get("wordsFlat"));
        if !flat.is_empty() {
            return Ok(RawForm::FlatWords(FlatWordsForm {
                title,
                description,
                grid_count,
                group_size,
                words: flat,
            }));
        }

        let words = array_like(doc.get("words"));
        if !words.is_empty() {
            if words.first().is_some_and(Value::is_array) {
                let rows = words.iter().map(|row| coerce_word_list(Some(row))).collect();
                return Ok(RawForm::LegacyTuple(LegacyTupleForm {
                    title,
                    description,
                    rows,
                    group_titles: solution_group_titles(doc),
                }));
            }
            return Ok(RawForm::FlatWords(FlatWordsForm {
                title,
                description,
                grid_count,
                group_size,
                words: words.iter().map(coerce_text).collect(),
            }));
        }

        Err(NormalizeError::MissingData)
    }
}

/// Maps any of the stored puzzle shapes into the canonical puzzle.
/// Structural shape is strictly validated; leaf scalar values are
/// defensively coerced.
pub fn normalize(id: &str, doc: &Value) -> Result<Puzzle, NormalizeError> {
    match RawForm::detect(doc)? {
        RawForm::Categories(form) => from_categories_form(id, form),
        RawForm::FlatWords(form) => from_flat_form(id, form),
        RawForm::LegacyTuple(form) => from_legacy_form(id, form),
    }
}

fn from_categories_form(id: &str, form: CategoriesForm) -> Result<Puzzle, NormalizeError> {
    let grid_count = form.grid_count.unwrap_or(form.categories.len());
    let group_size = match form.group_size {
        Some(size) => size,
        None => form
            .categories
            .first()
            .map(|category| category.words.len())
            .ok_or(NormalizeError::MissingData)?,
    };
    validate_bounds(grid_count, group_size)?;
    if form.categories.len() != grid_count {
        return Err(NormalizeError::shape("categories.length must equal gridSize"));
    }
    for (gi, category) in form.categories.iter().enumerate() {
        if category.words.len() != group_size {
            return Err(NormalizeError::shape(format!(
                "categories[{gi}].words must have {group_size} items"
            )));
        }
    }
    if let Some(flat) = &form.words_flat {
        if flat.len() != grid_count * group_size {
            return Err(NormalizeError::shape(
                "wordsFlat length must equal gridSize * groupSize",
            ));
        }
    }
    let rows: Vec<(String, Vec<String>)> = form
        .categories
        .into_iter()
        .map(|category| (category.title, category.words))
        .collect();
    build_puzzle(id, form.title, form.description, grid_count, group_size, rows)
}

fn from_flat_form(id: &str, form: FlatWordsForm) -> Result<Puzzle, NormalizeError> {
    // Sizes were only ever declared alongside the flat list; absent both,
    // this is the classic 4x4 board.
    let grid_count = form.grid_count.unwrap_or(4);
    let group_size = form.group_size.unwrap_or(4);
    validate_bounds(grid_count, group_size)?;
    if form.words.len() != grid_count * group_size {
        return Err(NormalizeError::shape(
            "wordsFlat length must equal gridSize * groupSize",
        ));
    }
    let rows: Vec<(String, Vec<String>)> = form
        .words
        .chunks(group_size)
        .enumerate()
        .map(|(gi, run)| (default_group_title(gi), run.to_vec()))
        .collect();
    build_puzzle(id, form.title, form.description, grid_count, group_size, rows)
}

fn from_legacy_form(id: &str, form: LegacyTupleForm) -> Result<Puzzle, NormalizeError> {
    let grid_count = form.rows.len();
    let group_size = form
        .rows
        .first()
        .map(Vec::len)
        .ok_or(NormalizeError::MissingData)?;
    validate_bounds(grid_count, group_size)?;
    for (gi, row) in form.rows.iter().enumerate() {
        if row.len() != group_size {
            return Err(NormalizeError::shape(format!(
                "words[{gi}] must have {group_size} items"
            )));
        }
    }
    let rows: Vec<(String, Vec<String>)> = form
        .rows
        .into_iter()
        .enumerate()
        .map(|(gi, row)| {
            let title = form
                .group_titles
                .get(gi)
                .filter(|title| !title.is_empty())
                .cloned()
                .unwrap_or_else(|| default_group_title(gi));
            (title, row)
        })
        .collect();
    build_puzzle(id, form.title, form.description, grid_count, group_size, rows)
}

fn build_puzzle(
    id: &str,
    title: String,
    description: String,
    grid_count: usize,
    group_size: usize,
    rows: Vec<(String, Vec<String>)>,
) -> Result<Puzzle, NormalizeError> {
    let mut words = Vec::with_capacity(grid_count * group_size);
    let mut categories = Vec::with_capacity(grid_count);
    for (gi, (cat_title, cat_words)) in rows.into_iter().enumerate() {
        let Some(group_id) = GroupId::from_index(gi) else {
            return Err(NormalizeError::shape("gridSize out of range (2..10)"));
        };
        for (wi, text) in cat_words.iter().enumerate() {
            words.push(Word {
                id: format!("{group_id}{}", wi + 1),
                text: text.clone(),
                group_id,
            });
        }
        categories.push(Category {
            title: cat_title,
            words: cat_words,
        });
    }
    Ok(Puzzle {
        id: id.to_string(),
        title,
        description,
        group_size,
        grid_count,
        words,
        categories,
    })
}

fn validate_bounds(grid_count: usize, group_size: usize) -> Result<(), NormalizeError> {
    if !(GRID_COUNT_MIN..=GRID_COUNT_MAX).contains(&grid_count) {
        return Err(NormalizeError::shape("gridSize out of range (2..10)"));
    }
    if !(GROUP_SIZE_MIN..=GROUP_SIZE_MAX).contains(&group_size) {
        return Err(NormalizeError::shape("groupSize out of range (2..10)"));
    }
    Ok(())
}

fn default_group_title(index: usize) -> String {
    match GroupId::from_index(index) {
        Some(group_id) => format!("Group {group_id}"),
        None => format!("Group {}", index + 1),
    }
}

fn declared_size(doc: &Value, key: &str) -> Option<usize> {
    doc.get(key)
        .and_then(Value::as_u64)
        .and_then(|size| usize::try_from(size).ok())
}

/// Accepts true arrays, and JSON objects standing in for arrays (a store
/// artifact); object values are read in insertion order.
fn array_like(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

fn coerce_word_list(value: Option<&Value>) -> Vec<String> {
    array_like(value).iter().map(coerce_text).collect()
}

/// Leaf-scalar leniency: strings pass through, numbers and booleans render,
/// word-bearing objects contribute their text field, everything else
/// becomes an empty string rather than failing the whole puzzle.
fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Object(map) => ["text", "word", "value"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn solution_group_titles(doc: &Value) -> Vec<String> {
    array_like(doc.get("solution").and_then(|solution| solution.get("groups")))
        .iter()
        .map(|group| {
            group
                .get("name")
                .or_else(|| group.get("title"))
                .map(coerce_text)
                .unwrap_or_default()
        })
        .collect()
}
