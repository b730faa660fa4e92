use crate::store::LocalStore;

/// `LocalStore` over the browser's `localStorage`. Every failure mode
/// (storage disabled, quota exceeded, private mode) is swallowed: the
/// local mirror is a best-effort cache, never a correctness dependency.
/// Off wasm32 this is a no-op stand-in so the crate compiles natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserLocalStore;

impl BrowserLocalStore {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_arch = "wasm32")]
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    }
}

#[cfg(target_arch = "wasm32")]
impl LocalStore for BrowserLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        let Some(storage) = Self::storage() else {
            return;
        };
        let _ = storage.set_item(key, value);
    }

    fn remove(&self, key: &str) {
        let Some(storage) = Self::storage() else {
            return;
        };
        let _ = storage.remove_item(key);
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl LocalStore for BrowserLocalStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}
