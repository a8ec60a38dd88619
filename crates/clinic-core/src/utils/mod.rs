//! Utility functions for formatting and weekday conversion.

pub mod format;
pub mod weekday;

// Re-export commonly used functions at module level
pub use format::{format_date, media_url, truncate_string};
