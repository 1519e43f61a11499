//! Birthday window around the coming Sunday service.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::Person;
use crate::utils::format_day_month;

/// Length of the window ending on next Sunday, in days
pub const WINDOW_DAYS: i64 = 7;

/// Highlight text for a birthday on the Sunday itself
pub const TODAY_HIGHLIGHT: &str = "heute!";

/// `today` if it is a Sunday, otherwise the following Sunday.
pub fn next_sunday(today: NaiveDate) -> NaiveDate {
    let days_ahead = (7 - today.weekday().num_days_from_sunday()) % 7;
    today + Duration::days(days_ahead as i64)
}

/// The birthday of someone born on `birthdate`, observed in `year`.
/// Feb 29 falls back to Feb 28 in common years.
pub fn anniversary_in(birthdate: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthdate.month(), birthdate.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
}

/// Days from the most recent birthday up to and including `sunday`, if it
/// lies within the window. `Some(0)` means the birthday is on `sunday`.
pub fn days_since_birthday(birthdate: NaiveDate, sunday: NaiveDate) -> Option<(i64, NaiveDate)> {
    // Early January windows reach back into the previous year
    [sunday.year(), sunday.year() - 1]
        .into_iter()
        .filter_map(|year| anniversary_in(birthdate, year))
        .map(|day| ((sunday - day).num_days(), day))
        .find(|(delta, _)| (0..WINDOW_DAYS).contains(delta))
}

/// Check-in form marker: `"heute!"` for a birthday on `sunday`, `"DD.MM."`
/// for one in the six days before, empty otherwise.
pub fn birthday_highlight(birthdate: Option<NaiveDate>, sunday: NaiveDate) -> String {
    match birthdate.and_then(|b| days_since_birthday(b, sunday)) {
        Some((0, _)) => TODAY_HIGHLIGHT.to_string(),
        Some((_, day)) => format_day_month(day),
        None => String::new(),
    }
}

/// Report lines `"{firstName} {lastName} {DD.MM.}"` for everyone with a
/// birthday in the week ending on `sunday`. Persons listed in several
/// rosters are printed once.
pub fn upcoming_birthdays<'a>(persons: impl IntoIterator<Item = &'a Person>, sunday: NaiveDate) -> Vec<String> {
    let mut seen = HashSet::new();

    persons
        .into_iter()
        .filter(|p| seen.insert(p.id))
        .filter_map(|p| {
            let birthdate = p.birthday_date?;
            let (_, day) = days_since_birthday(birthdate, sunday)?;
            Some(format!("{} {} {}", p.first_name, p.last_name, format_day_month(day)))
        })
        .collect()
}
