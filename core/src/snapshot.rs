use serde::Serialize;
use serde_json::{json, Value};

use crate::run::RunState;

pub const LOCAL_KEY_PREFIX: &str = "tsunagari:";

pub fn local_run_key(puzzle_id: &str) -> String {
    format!("{LOCAL_KEY_PREFIX}{puzzle_id}")
}

/// Storage-facing form of a run: the state verbatim plus the client
/// timestamp of the write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub ts: i64,
    pub run: RunState,
}

impl RunSnapshot {
    pub fn new(run: RunState, ts: i64) -> Self {
        Self { ts, run }
    }

    /// A freshly cleared snapshot: not completed, no progress.
    pub fn cleared(ts: i64) -> Self {
        Self {
            ts,
            run: RunState::default(),
        }
    }
}

/// Wraps each found group in a single-field container, because the remote
/// store's array type cannot nest arrays directly.
pub fn pack_found_ids(found: &[Vec<String>]) -> Value {
    Value::Array(
        found
            .iter()
            .map(|group| json!({ "items": group }))
            .collect(),
    )
}

/// Inverse of `pack_found_ids`. Also accepts the legacy unpacked shape
/// (a raw array of arrays) written before packing was introduced; anything
/// else decodes to empty.
pub fn unpack_found_ids(value: &Value) -> Vec<Vec<String>> {
    let Some(raw) = value.as_array() else {
        return Vec::new();
    };
    if raw.first().is_some_and(Value::is_array) {
        return raw.iter().map(string_items).collect();
    }
    raw.iter()
        .map(|entry| entry.get("items").map(string_items).unwrap_or_default())
        .collect()
}

fn string_items(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Decodes a stored snapshot document, tolerating absent or mistyped
/// fields: every field falls back to its documented default instead of
/// failing. `fallback_ts` stands in for a missing timestamp. The run
/// metadata also accepts the top-level mirror fields written by remote
/// saves.
pub fn decode_snapshot(doc: &Value, fallback_ts: i64) -> RunSnapshot {
    let run = doc.get("run").cloned().unwrap_or(Value::Null);
    let string_field = |name: &str| {
        run.get(name)
            .and_then(Value::as_str)
            .or_else(|| doc.get(name).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    };
    RunSnapshot {
        ts: doc.get("ts").and_then(Value::as_i64).unwrap_or(fallback_ts),
        run: RunState {
            title: string_field("title"),
            author: string_field("author"),
            moves: run
                .get("moves")
                .and_then(Value::as_u64)
                .map(|moves| u32::try_from(moves).unwrap_or(u32::MAX))
                .unwrap_or(0),
            completed: run
                .get("completed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            selected_ids: run
                .get("selectedIds")
                .map(string_items)
                .unwrap_or_default(),
            found_ids: run
                .get("foundIds")
                .map(unpack_found_ids)
                .unwrap_or_default(),
            seed: run
                .get("seed")
                .and_then(Value::as_u64)
                .and_then(|seed| u32::try_from(seed).ok()),
        },
    }
}

/// Builds the remote document for a snapshot: the run with `foundIds`
/// packed, plus the top-level mirror fields existing documents carry.
pub fn remote_payload(snapshot: &RunSnapshot, updated_at: i64) -> Value {
    let mut run = serde_json::to_value(&snapshot.run).unwrap_or_else(|_| json!({}));
    run["foundIds"] = pack_found_ids(&snapshot.run.found_ids);
    json!({
        "run": run,
        "ts": snapshot.ts,
        "title": snapshot.run.title,
        "author": snapshot.run.author,
        "completed": snapshot.run.completed,
        // A save is live progress: it lifts any soft-delete left by clear.
        "deleted": false,
        "updatedAt": updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|group| group.iter().map(|id| (*id).to_string()).collect())
            .collect()
    }

    #[test]
    fn pack_unpack_round_trips() {
        let found = groups(&[&["A1", "A2"], &["B1", "B2"]]);
        assert_eq!(unpack_found_ids(&pack_found_ids(&found)), found);
        let empty: Vec<Vec<String>> = Vec::new();
        assert_eq!(unpack_found_ids(&pack_found_ids(&empty)), empty);
    }

    #[test]
    fn unpack_accepts_legacy_nested_arrays() {
        let legacy = json!([["A1", "A2"], ["B1", "B2"]]);
        assert_eq!(
            unpack_found_ids(&legacy),
            groups(&[&["A1", "A2"], &["B1", "B2"]])
        );
    }

    #[test]
    fn unpack_tolerates_junk() {
        assert!(unpack_found_ids(&json!("nope")).is_empty());
        assert!(unpack_found_ids(&json!(null)).is_empty());
        assert_eq!(
            unpack_found_ids(&json!([{ "items": "broken" }, { "items": ["C1"] }])),
            groups(&[&[], &["C1"]])
        );
    }

    #[test]
    fn decode_defaults_missing_fields() {
        let snapshot = decode_snapshot(&json!({}), 1234);
        assert_eq!(snapshot.ts, 1234);
        assert_eq!(snapshot.run, RunState::default());

        let partial = decode_snapshot(
            &json!({ "ts": 99, "run": { "moves": "three", "completed": 1, "seed": -5 } }),
            0,
        );
        assert_eq!(partial.ts, 99);
        assert_eq!(partial.run.moves, 0);
        assert!(!partial.run.completed);
        assert_eq!(partial.run.seed, None);
    }

    #[test]
    fn decode_reads_top_level_metadata_mirrors() {
        let doc = json!({ "ts": 5, "title": "Mirror", "author": "amy", "run": { "moves": 2 } });
        let snapshot = decode_snapshot(&doc, 0);
        assert_eq!(snapshot.run.title, "Mirror");
        assert_eq!(snapshot.run.author, "amy");
        assert_eq!(snapshot.run.moves, 2);
    }

    #[test]
    fn remote_payload_packs_and_mirrors() {
        let mut run = RunState::new("Demo", "jane");
        run.moves = 3;
        run.completed = true;
        run.found_ids = groups(&[&["A1", "A2"]]);
        run.seed = Some(7);
        let snapshot = RunSnapshot::new(run, 1000);
        let payload = remote_payload(&snapshot, 2000);
        assert_eq!(payload["title"], "Demo");
        assert_eq!(payload["completed"], true);
        assert_eq!(payload["updatedAt"], 2000);
        assert_eq!(payload["run"]["foundIds"][0]["items"][0], "A1");
        assert_eq!(payload["run"]["seed"], 7);

        let decoded = decode_snapshot(&payload, 0);
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn snapshot_json_round_trips_through_decode() {
        let mut run = RunState::new("Demo", "");
        run.selected_ids = vec!["B1".to_string()];
        run.found_ids = groups(&[&["A1", "A2"]]);
        let snapshot = RunSnapshot::new(run, 42);
        let raw = serde_json::to_string(&snapshot).expect("encode");
        let value: Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(decode_snapshot(&value, 0), snapshot);
    }

    #[test]
    fn local_keys_are_scoped_by_puzzle() {
        assert_eq!(local_run_key("p1"), "tsunagari:p1");
    }
}
