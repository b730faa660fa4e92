use std::fmt;

use serde_json::Value;

use tsunagari_core::catalog::{puzzle_by_slug, DEMO_PUZZLE_SLUG};
use tsunagari_core::normalize::{normalize, NormalizeError};
use tsunagari_core::puzzle::Puzzle;

use crate::diag;
use crate::store::{DocumentStore, PuzzleQuery, QueryOrder, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleLoadError {
    NotFound,
    Invalid(NormalizeError),
    Unavailable(StoreError),
}

impl fmt::Display for PuzzleLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleLoadError::NotFound => write!(f, "puzzle not found"),
            PuzzleLoadError::Invalid(err) => write!(f, "puzzle unavailable: {err}"),
            PuzzleLoadError::Unavailable(err) => write!(f, "puzzle unavailable: {err}"),
        }
    }
}

impl std::error::Error for PuzzleLoadError {}

/// Fetches and normalizes one puzzle document. The reserved demo id is
/// served from the built-in catalog without a store read. A malformed
/// document is as unavailable as a missing one; nothing is auto-repaired.
pub async fn load_puzzle<D: DocumentStore>(
    docs: &D,
    id: &str,
) -> Result<Puzzle, PuzzleLoadError> {
    if id == DEMO_PUZZLE_SLUG {
        if let Some(puzzle) = puzzle_by_slug(id) {
            return Ok(puzzle);
        }
    }
    let doc = docs
        .get(&format!("puzzles/{id}"))
        .await
        .map_err(PuzzleLoadError::Unavailable)?
        .ok_or(PuzzleLoadError::NotFound)?;
    normalize(id, &doc).map_err(PuzzleLoadError::Invalid)
}

/// Lightweight card model for browse grids; every field defaults rather
/// than failing on a sparse document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub solve_count: u64,
    pub created_by: String,
    pub is_pinned: bool,
    pub created_at: i64,
}

/// Browse-grid loader: an ordered list of query strategies tried in
/// sequence until one succeeds, for projects whose composite indexes are
/// not all available yet.
pub async fn browse_puzzles<D: DocumentStore>(
    docs: &D,
    limit: usize,
) -> Result<Vec<PuzzleCard>, StoreError> {
    let strategies = [
        QueryOrder::PublishedAt,
        QueryOrder::CreatedAt,
        QueryOrder::Unordered,
    ];
    let mut last_error = None;
    for order in strategies {
        let query = PuzzleQuery {
            published_only: true,
            order,
            limit,
        };
        match docs.query("puzzles", &query).await {
            Ok(rows) => {
                return Ok(rows
                    .iter()
                    .map(|(id, doc)| card_from_doc(id, doc))
                    .collect());
            }
            Err(err) => {
                diag::warn(&format!("[browse] query strategy {order:?} failed: {err}"));
                last_error = Some(err);
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| StoreError::Unavailable("no query strategy ran".to_string())))
}

fn card_from_doc(id: &str, doc: &Value) -> PuzzleCard {
    let text = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let category = doc
        .get("category")
        .and_then(Value::as_str)
        .or_else(|| {
            doc.get("categories")
                .and_then(|categories| categories.get(0))
                .and_then(|first| first.get("title"))
                .and_then(Value::as_str)
        })
        .unwrap_or("General")
        .to_string();
    let created_by = doc
        .get("author")
        .map(|author| {
            author
                .get("name")
                .or_else(|| author.get("email"))
                .and_then(Value::as_str)
                .unwrap_or("Anonymous")
                .to_string()
        })
        .or_else(|| {
            doc.get("createdBy")
                .and_then(|created| created.get("displayName"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Anonymous".to_string());
    PuzzleCard {
        id: id.to_string(),
        title: doc
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Untitled")
            .to_string(),
        description: text(doc.get("description")),
        category,
        difficulty: title_case(
            doc.get("difficulty")
                .and_then(Value::as_str)
                .unwrap_or("medium"),
        ),
        solve_count: doc
            .get("solveCount")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        created_by,
        is_pinned: doc
            .get("isPinned")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        created_at: doc
            .get("publishedAt")
            .or_else(|| doc.get("createdAt"))
            .and_then(Value::as_i64)
            .unwrap_or(0),
    }
}

fn title_case(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
