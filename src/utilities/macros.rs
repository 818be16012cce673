//! Convenience macros for the cardboot project
#![macro_use]

/// Kilobytes to bytes.
#[macro_export]
macro_rules! kb {
    ($val:expr) => {
        $val * 1024
    };
}
