/// Client wall-clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as i64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Seed for a board that has never been laid out: current time, so fresh
/// shuffles differ. Once drawn it is captured into the run state and
/// persisted, and from then on the layout is reproducible.
pub fn fresh_seed() -> u32 {
    now_ms() as u32
}
