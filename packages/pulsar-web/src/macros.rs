/// Log a message to the JavaScript console if on wasm32. Otherwise logs it
/// to stdout.
#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            $crate::web_sys::console::log_1(&::std::format!($($arg)*).into());
        } else {
            ::std::println!($($arg)*);
        }
    };
}

/// Log a warning to the JavaScript console if on wasm32. Otherwise logs it
/// to stderr.
#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            $crate::web_sys::console::warn_1(&::std::format!($($arg)*).into());
        } else {
            ::std::eprintln!($($arg)*);
        }
    };
}

/// Prints an error message to the JavaScript console if on wasm32.
/// Otherwise logs it to stderr.
#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => {
        if cfg!(target_arch = "wasm32") {
            $crate::web_sys::console::error_1(&::std::format!($($arg)*).into());
        } else {
            ::std::eprintln!($($arg)*);
        }
    };
}
