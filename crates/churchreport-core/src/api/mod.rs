//! REST API client module for the ChurchTools API.
//!
//! This module provides the `ChurchApi` trait, the narrow set of endpoints
//! the reports need, and `ApiClient`, its reqwest-backed implementation.
//!
//! The API authenticates with a long-lived login token sent in the
//! `Authorization: Login <token>` header.

pub mod client;
pub mod error;

pub use client::{ApiClient, ChurchApi};
pub use error::ApiError;

#[cfg(test)]
pub use client::MockChurchApi;
