//! Logging abstraction
//!
//! Unified logging macros that work across targets:
//! - Embedded (`defmt` feature): routed to defmt
//! - Host tests: `println!` / `eprintln!`
//! - Host non-test: no-op
//!
//! Log output is best-effort and never blocks; keep format strings simple
//! (no precision specifiers) so they stay valid for both defmt and core::fmt.

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[INFO] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[WARN] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        eprintln!("[ERROR] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[DEBUG] {}", format_args!($($arg)*));

        #[cfg(all(not(feature = "defmt"), not(test)))]
        {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}
