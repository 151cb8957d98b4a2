//! FILENAME: dataset/src/logging.rs
// PURPOSE: Category-tagged logging macros shared by every dashboard crate.
// CONTEXT: Each line carries a short category ("LOAD", "ROLLUP", "CASCADE", ...)
//          which becomes the `log` target, so hosts can filter per subsystem.
//          No logger is installed here; the embedding application owns that.

/// Categories used across the workspace.
pub const CAT_LOAD: &str = "LOAD";
pub const CAT_ROLLUP: &str = "ROLLUP";
pub const CAT_ADJ: &str = "ADJ";
pub const CAT_CASCADE: &str = "CASCADE";
pub const CAT_VIEW: &str = "VIEW";

/// Formats the message of an ENTER line.
pub fn enter_message(func_name: &str, params: &str) -> String {
    if params.is_empty() {
        format!("ENTER {}", func_name)
    } else {
        format!("ENTER {} {}", func_name, params)
    }
}

/// Formats the message of an EXIT line.
pub fn exit_message(func_name: &str, result: &str) -> String {
    if result.is_empty() {
        format!("EXIT {}", func_name)
    } else {
        format!("EXIT {} {}", func_name, result)
    }
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::info!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::warn!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::error!(target: $cat, $($arg)*)
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        $crate::log::debug!(target: $cat, "{}", $crate::logging::enter_message($func, ""))
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::log::debug!(target: $cat, "{}", $crate::logging::enter_message($func, &format!($($arg)*)))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        $crate::log::debug!(target: $cat, "{}", $crate::logging::exit_message($func, ""))
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::log::debug!(target: $cat, "{}", $crate::logging::exit_message($func, &format!($($arg)*)))
    };
}

// Re-export the macros so they can be imported via `use dataset::logging::log_info;`
pub use log_debug;
pub use log_enter;
pub use log_error;
pub use log_exit;
pub use log_info;
pub use log_warn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit_messages() {
        assert_eq!(enter_message("aggregate", ""), "ENTER aggregate");
        assert_eq!(enter_message("aggregate", "rows=3"), "ENTER aggregate rows=3");
        assert_eq!(exit_message("aggregate", "nodes=4"), "EXIT aggregate nodes=4");
    }

    #[test]
    fn test_macros_expand_without_logger() {
        log_debug!(CAT_LOAD, "rows={}", 3);
        log_info!(CAT_ROLLUP, "plain");
        log_warn!(CAT_CASCADE, "axis={}", "program");
        log_error!(CAT_VIEW, "view={}", "students");
        log_enter!(CAT_ADJ, "build_adjacency");
        log_exit!(CAT_ADJ, "build_adjacency", "pairs={}", 2);
    }
}
