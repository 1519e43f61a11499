//! Core library for churchreport.
//!
//! Reads persons, groups and meeting attendance from a ChurchTools instance
//! and prepares them for printed reports: family-sorted rosters with
//! portraits and children, absence streaks, and upcoming birthdays.

pub mod api;
pub mod attendance;
pub mod birthdays;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod family;
pub mod models;
pub mod portrait;
pub mod render;
pub mod reports;
pub mod roster;
pub mod utils;

pub use api::{ApiClient, ApiError, ChurchApi};
pub use config::{ApiConfig, Config};
