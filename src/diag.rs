/// Console diagnostics. Sync failures are reported here and nowhere else:
/// they must never interrupt play.
pub fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        gloo::console::warn!(message.to_string());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("warning: {message}");
    }
}

pub fn info(message: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        gloo::console::log!(message.to_string());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("{message}");
    }
}
