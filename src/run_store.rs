use serde_json::{json, Value};

use tsunagari_core::snapshot::{decode_snapshot, local_run_key, remote_payload, RunSnapshot};

use crate::clock::now_ms;
use crate::diag;
use crate::store::{DocumentStore, IdentityProvider, LocalStore, UserId};

/// Persistence coordinator for one device. Mirrors run snapshots to the
/// local store on every save and, when a user is signed in, to the remote
/// store as well. Anonymous sessions never get a remote record. Remote
/// failures are logged and contained here: a dropped cloud sync must never
/// block gameplay.
pub struct RunStore<D, L, I> {
    docs: D,
    local: L,
    identity: I,
}

impl<D, L, I> RunStore<D, L, I>
where
    D: DocumentStore,
    L: LocalStore,
    I: IdentityProvider,
{
    pub fn new(docs: D, local: L, identity: I) -> Self {
        Self {
            docs,
            local,
            identity,
        }
    }

    pub fn docs(&self) -> &D {
        &self.docs
    }

    pub async fn save(&self, puzzle_id: &str, snapshot: &RunSnapshot) {
        self.save_local(puzzle_id, snapshot);
        let Some(uid) = self.identity.current_user() else {
            return;
        };
        let stamp = now_ms();
        let payload = remote_payload(snapshot, stamp);
        if let Err(err) = self
            .docs
            .set(&run_doc_path(&uid, puzzle_id), payload, true)
            .await
        {
            diag::warn(&format!("[persist:save] remote write failed: {err}"));
        }
        let meta = json!({
            "lastActive": puzzle_id,
            "lastActiveUpdatedAt": stamp,
        });
        if let Err(err) = self.docs.set(&user_doc_path(&uid), meta, true).await {
            diag::warn(&format!("[persist:save] user metadata write failed: {err}"));
        }
    }

    /// Loads the snapshot to resume from. With a signed-in user the remote
    /// copy is authoritative and gets mirrored back into the local store;
    /// on a remote miss or failure (or with no user at all) the local copy
    /// is the answer.
    pub async fn load(&self, puzzle_id: &str) -> Option<RunSnapshot> {
        if let Some(uid) = self.identity.current_user() {
            match self.docs.get(&run_doc_path(&uid, puzzle_id)).await {
                Ok(Some(doc)) => {
                    let deleted = doc
                        .get("deleted")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    if !deleted {
                        let snapshot = decode_snapshot(&doc, now_ms());
                        self.save_local(puzzle_id, &snapshot);
                        return Some(snapshot);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    diag::warn(&format!("[persist:load] remote read failed: {err}"));
                }
            }
        }
        self.load_local(puzzle_id)
    }

    /// Soft-clears a run: the local copy becomes a fresh, uncompleted
    /// snapshot, and the remote record (if any) is flagged `deleted` with a
    /// refreshed timestamp rather than physically removed. Do not keep
    /// mutating run state in the same tick as a `clear` without an
    /// intervening `load`; the two writes are unordered.
    pub async fn clear(&self, puzzle_id: &str) {
        self.save_local(puzzle_id, &RunSnapshot::cleared(now_ms()));
        let Some(uid) = self.identity.current_user() else {
            return;
        };
        let flag = json!({ "deleted": true, "updatedAt": now_ms() });
        if let Err(err) = self
            .docs
            .set(&run_doc_path(&uid, puzzle_id), flag, true)
            .await
        {
            diag::warn(&format!("[persist:clear] remote write failed: {err}"));
        }
    }

    fn save_local(&self, puzzle_id: &str, snapshot: &RunSnapshot) {
        if let Ok(raw) = serde_json::to_string(snapshot) {
            self.local.set(&local_run_key(puzzle_id), &raw);
        }
    }

    fn load_local(&self, puzzle_id: &str) -> Option<RunSnapshot> {
        let raw = self.local.get(&local_run_key(puzzle_id))?;
        let value: Value = serde_json::from_str(&raw).ok()?;
        Some(decode_snapshot(&value, now_ms()))
    }
}

fn run_doc_path(uid: &UserId, puzzle_id: &str) -> String {
    format!("users/{uid}/runs/{puzzle_id}")
}

fn user_doc_path(uid: &UserId) -> String {
    format!("users/{uid}")
}
