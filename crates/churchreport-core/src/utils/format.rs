use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

/// Date format used by the ChurchTools API
const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an API date (`YYYY-MM-DD`). The whole trimmed input must match;
/// trailing characters are an error.
pub fn parse_api_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), API_DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))
}

/// Format a date the way German reports print it: `21.05.1990`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Day and month only: `21.05.`
pub fn format_day_month(date: NaiveDate) -> String {
    date.format("%d.%m.").to_string()
}

/// Turn a raw API birthdate into its display string and parsed date.
///
/// Absent or empty input yields `("", None)`. Anything else must be a valid
/// `YYYY-MM-DD` date.
pub fn format_birthdate(raw: Option<&str>) -> Result<(String, Option<NaiveDate>)> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok((String::new(), None)),
        Some(s) => {
            let date = parse_api_date(s)?;
            Ok((format_date(date), Some(date)))
        }
    }
}

/// Age in completed years on `today`
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age
}
