//! Utility functions for date parsing and formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{age_on, format_birthdate, format_date, format_day_month, parse_api_date};
