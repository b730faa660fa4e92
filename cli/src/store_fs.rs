use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use tsunagari::{DocumentStore, LocalStore, PuzzleQuery, QueryOrder, StoreError, UserId};

const PROFILE_FILE: &str = "profile.json";
const LOCAL_DIR: &str = "local";

fn io_err(err: std::io::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// Document store over a directory tree: `users/u1/runs/p1` lives at
/// `<root>/users/u1/runs/p1.json`.
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn doc_file(&self, path: &str) -> PathBuf {
        let mut file = self.root.clone();
        for segment in path.split('/') {
            file.push(segment);
        }
        file.set_extension("json");
        file
    }
}

impl DocumentStore for FileDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let file = self.doc_file(path);
        let raw = match tokio::fs::read_to_string(&file).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(err)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    async fn set(&self, path: &str, fields: Value, merge: bool) -> Result<(), StoreError> {
        let doc = if merge {
            match self.get(path).await? {
                Some(mut existing) => {
                    if let (Some(target), Some(incoming)) =
                        (existing.as_object_mut(), fields.as_object())
                    {
                        for (key, value) in incoming {
                            target.insert(key.clone(), value.clone());
                        }
                        existing
                    } else {
                        fields
                    }
                }
                None => fields,
            }
        } else {
            fields
        };
        let file = self.doc_file(path);
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let raw =
            serde_json::to_string_pretty(&doc).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        tokio::fs::write(&file, raw).await.map_err(io_err)
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.doc_file(path)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(err)),
        }
    }

    async fn query(
        &self,
        collection: &str,
        query: &PuzzleQuery,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let dir = self.root.join(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(err)),
        };
        let mut rows = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let raw = tokio::fs::read_to_string(&path).await.map_err(io_err)?;
            let Ok(doc) = serde_json::from_str::<Value>(&raw) else {
                continue;
            };
            if query.published_only
                && !doc
                    .get("isPublished")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            {
                continue;
            }
            rows.push((id.to_string(), doc));
        }
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

/// Local mirror as one file per key, best-effort like the browser storage
/// it stands in for.
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    pub fn new(root: &Path) -> Self {
        Self {
            dir: root.join(LOCAL_DIR),
        }
    }

    fn key_file(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_file(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if fs::create_dir_all(&self.dir).is_err() {
            return;
        }
        let _ = fs::write(self.key_file(key), value);
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.key_file(key));
    }
}

#[derive(Serialize, Deserialize)]
struct StoredProfile {
    v: u8,
    key: String,
}

/// Loads the player profile, creating one on first run. The uid is derived
/// from a locally generated random key, so the same data dir is the same
/// player across invocations.
pub fn load_or_create_uid(root: &Path) -> Result<UserId, StoreError> {
    let file = root.join(PROFILE_FILE);
    if let Ok(raw) = fs::read_to_string(&file) {
        if let Ok(profile) = serde_json::from_str::<StoredProfile>(&raw) {
            if profile.v == 1 {
                if let Ok(key) = URL_SAFE_NO_PAD.decode(profile.key.as_bytes()) {
                    return Ok(derive_uid(&key));
                }
            }
        }
        // Unreadable profile: regenerate rather than fail the session.
    }
    let mut key = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    let profile = StoredProfile {
        v: 1,
        key: URL_SAFE_NO_PAD.encode(&key),
    };
    fs::create_dir_all(root).map_err(io_err)?;
    let raw = serde_json::to_string_pretty(&profile)
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    fs::write(&file, raw).map_err(io_err)?;
    Ok(derive_uid(&key))
}

fn derive_uid(key: &[u8]) -> UserId {
    let digest = Sha256::digest(key);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    UserId::new(&format!("u{:016x}", u64::from_be_bytes(bytes)))
}
