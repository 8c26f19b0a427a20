/// Macros for leveled diagnostics on stderr.
///
/// Usage:
/// ```ignore
/// log_info!("compiling {} to {}", input, output);
/// log_warn!("duplicate definition of variable '{}'", name);
/// ```
///
/// The sink (level filter, text vs JSON sequence format) is configured
/// once at startup via `core::log::init`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if $crate::core::log::enabled($crate::core::log::Level::Error) {
            $crate::core::log::emit($crate::core::log::Level::Error, &format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if $crate::core::log::enabled($crate::core::log::Level::Warn) {
            $crate::core::log::emit($crate::core::log::Level::Warn, &format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::core::log::enabled($crate::core::log::Level::Info) {
            $crate::core::log::emit($crate::core::log::Level::Info, &format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::core::log::enabled($crate::core::log::Level::Debug) {
            $crate::core::log::emit($crate::core::log::Level::Debug, &format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        if $crate::core::log::enabled($crate::core::log::Level::Trace) {
            $crate::core::log::emit($crate::core::log::Level::Trace, &format!($($arg)*));
        }
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `omnikit::resolve` instead of `omnikit::core::resolve`
pub use core::*;
pub use utils::*;
