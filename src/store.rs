use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Generic transient store failure. Persistence is best-effort everywhere,
/// so this only ever reaches a log line or a fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(uid: &str) -> Self {
        Self(uid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Current-identity query. Absence of a user means "cloud sync disabled
/// for this session", never an error. Queried at the start of each store
/// operation instead of holding a standing auth subscription.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrder {
    PublishedAt,
    CreatedAt,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleQuery {
    pub published_only: bool,
    pub order: QueryOrder,
    pub limit: usize,
}

/// Remote document store (stands in for a cloud document database).
/// Paths are slash-joined (`users/{uid}/runs/{puzzleId}`); documents are
/// plain JSON objects. All operations are async and fallible.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;
    /// With `merge`, top-level fields are merged into an existing document;
    /// otherwise the document is replaced.
    async fn set(&self, path: &str, fields: Value, merge: bool) -> Result<(), StoreError>;
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
    async fn query(
        &self,
        collection: &str,
        query: &PuzzleQuery,
    ) -> Result<Vec<(String, Value)>, StoreError>;
}

/// Local key-value store (stands in for browser local storage): sync and
/// best-effort, failures are swallowed by implementations.
pub trait LocalStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<T: DocumentStore> DocumentStore for std::rc::Rc<T> {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(path).await
    }

    async fn set(&self, path: &str, fields: Value, merge: bool) -> Result<(), StoreError> {
        (**self).set(path, fields, merge).await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        (**self).delete(path).await
    }

    async fn query(
        &self,
        collection: &str,
        query: &PuzzleQuery,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        (**self).query(collection, query).await
    }
}

impl<T: LocalStore> LocalStore for std::rc::Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

impl<T: IdentityProvider> IdentityProvider for std::rc::Rc<T> {
    fn current_user(&self) -> Option<UserId> {
        (**self).current_user()
    }
}

/// Identity double with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity {
    user: Option<UserId>,
}

impl FixedIdentity {
    pub fn signed_in(uid: &str) -> Self {
        Self {
            user: Some(UserId::new(uid)),
        }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}

/// In-memory document store with merge-write semantics and injectable
/// failures, for tests and offline embedders.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: RefCell<BTreeMap<String, Value>>,
    failing: Cell<bool>,
    failing_orders: RefCell<Vec<QueryOrder>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail until reset, simulating lost
    /// connectivity.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Makes queries with the given order fail, simulating a missing
    /// index.
    pub fn fail_order(&self, order: QueryOrder) {
        self.failing_orders.borrow_mut().push(order);
    }

    pub fn insert(&self, path: &str, doc: Value) {
        self.docs.borrow_mut().insert(path.to_string(), doc);
    }

    pub fn document(&self, path: &str) -> Option<Value> {
        self.docs.borrow().get(path).cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.get() {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.check_available()?;
        Ok(self.docs.borrow().get(path).cloned())
    }

    async fn set(&self, path: &str, fields: Value, merge: bool) -> Result<(), StoreError> {
        self.check_available()?;
        let mut docs = self.docs.borrow_mut();
        match docs.get_mut(path) {
            Some(existing) if merge => {
                if let (Some(target), Some(incoming)) =
                    (existing.as_object_mut(), fields.as_object())
                {
                    for (key, value) in incoming {
                        target.insert(key.clone(), value.clone());
                    }
                } else {
                    *existing = fields;
                }
            }
            _ => {
                docs.insert(path.to_string(), fields);
            }
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.docs.borrow_mut().remove(path);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: &PuzzleQuery,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        self.check_available()?;
        if self.failing_orders.borrow().contains(&query.order) {
            return Err(StoreError::Unavailable("missing index".to_string()));
        }
        let prefix = format!("{collection}/");
        let mut rows: Vec<(String, Value)> = self
            .docs
            .borrow()
            .iter()
            .filter(|(path, _)| {
                path.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .filter(|(_, doc)| {
                !query.published_only
                    || doc
                        .get("isPublished")
                        .and_then(Value::as_bool)
                        .unwrap_or(false)
            })
            .map(|(path, doc)| (path[prefix.len()..].to_string(), doc.clone()))
            .collect();
        let order_field = match query.order {
            QueryOrder::PublishedAt => Some("publishedAt"),
            QueryOrder::CreatedAt => Some("createdAt"),
            QueryOrder::Unordered => None,
        };
        if let Some(field) = order_field {
            rows.sort_by_key(|(_, doc)| {
                std::cmp::Reverse(doc.get(field).and_then(Value::as_i64).unwrap_or(i64::MIN))
            });
        }
        rows.truncate(query.limit);
        Ok(rows)
    }
}

/// In-memory local store; `set_failing` turns it into the silently broken
/// storage of a private-mode browser.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: RefCell<BTreeMap<String, String>>,
    failing: Cell<bool>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        if self.failing.get() {
            return None;
        }
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if self.failing.get() {
            return;
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        if self.failing.get() {
            return;
        }
        self.entries.borrow_mut().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn merge_preserves_untouched_fields() {
        let store = MemoryDocumentStore::new();
        store.insert("users/u1/runs/p1", json!({ "run": { "moves": 3 }, "ts": 1 }));
        store
            .set("users/u1/runs/p1", json!({ "deleted": true }), true)
            .await
            .expect("merge");
        let doc = store.document("users/u1/runs/p1").expect("doc");
        assert_eq!(doc["run"]["moves"], 3);
        assert_eq!(doc["deleted"], true);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_unavailable() {
        let store = MemoryDocumentStore::new();
        store.set_failing(true);
        let result = store.get("users/u1").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn query_filters_orders_and_limits() {
        let store = MemoryDocumentStore::new();
        store.insert("puzzles/a", json!({ "isPublished": true, "publishedAt": 10 }));
        store.insert("puzzles/b", json!({ "isPublished": true, "publishedAt": 30 }));
        store.insert("puzzles/c", json!({ "isPublished": false, "publishedAt": 20 }));
        store.insert("puzzles/b/plays/u1", json!({ "isPublished": true }));
        let query = PuzzleQuery {
            published_only: true,
            order: QueryOrder::PublishedAt,
            limit: 10,
        };
        let rows = store.query("puzzles", &query).await.expect("query");
        let ids: Vec<&str> = rows.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);

        let capped = PuzzleQuery { limit: 1, ..query };
        assert_eq!(store.query("puzzles", &capped).await.expect("query").len(), 1);
    }

    #[test]
    fn failing_local_store_swallows_everything() {
        let store = MemoryLocalStore::new();
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.set_failing(true);
        store.set("k", "other");
        assert_eq!(store.get("k"), None);
    }
}
