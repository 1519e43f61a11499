//! API client for communicating with the ChurchTools REST API.
//!
//! `ChurchApi` lists the handful of endpoints the reports use; `ApiClient`
//! implements it over reqwest. Pipelines depend on the trait so tests can
//! substitute a mock.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::config::ApiConfig;
use crate::models::{ApiPerson, GroupMeeting, GroupMember, MeetingMember, Relationship};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size for person-like collections. The API caps it at 500.
pub const MAX_PERSONS_LIMIT: u32 = 500;

/// Page size for group member collections. The API caps it at 100.
pub const MAX_GROUP_MEMBERS_LIMIT: u32 = 100;

/// Every ChurchTools response wraps its payload in `{"data": ...}`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// The typed subset of the ChurchTools API used by the reports.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChurchApi: Send + Sync {
    /// All persons visible to the API user
    async fn fetch_persons(&self) -> Result<Vec<ApiPerson>>;

    /// A single person by identifier
    async fn fetch_person(&self, person_id: &str) -> Result<ApiPerson>;

    /// Memberships of a group, including each member's role
    async fn fetch_group_members(&self, group_id: i64) -> Result<Vec<GroupMember>>;

    /// Spouse and child links of a person
    async fn fetch_relationships(&self, person_id: i64) -> Result<Vec<Relationship>>;

    /// Meetings of a group starting in `[from, to)`
    async fn fetch_group_meetings(
        &self,
        group_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<GroupMeeting>>;

    /// Attendance records of one meeting
    async fn fetch_meeting_members(&self, group_id: i64, meeting_id: i64) -> Result<Vec<MeetingMember>>;

    /// Raw bytes of a profile picture
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

/// API client for ChurchTools.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new API client for the given instance
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Login {}", self.config.login_token))
                .context("Login token contains invalid header characters")?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// GET an API path and unwrap the `data` envelope
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.config.url(path);
        debug!(url = %url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        Self::parse_envelope(&text).with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    fn parse_envelope<T: DeserializeOwned>(text: &str) -> Result<T> {
        let envelope: DataEnvelope<T> = serde_json::from_str(text)?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ChurchApi for ApiClient {
    async fn fetch_persons(&self) -> Result<Vec<ApiPerson>> {
        let persons: Vec<ApiPerson> = self
            .get("persons", &[("limit", MAX_PERSONS_LIMIT.to_string())])
            .await?;
        debug!(count = persons.len(), "Fetched persons");
        Ok(persons)
    }

    async fn fetch_person(&self, person_id: &str) -> Result<ApiPerson> {
        self.get(&format!("persons/{}", person_id), &[]).await
    }

    async fn fetch_group_members(&self, group_id: i64) -> Result<Vec<GroupMember>> {
        let members: Vec<GroupMember> = self
            .get(
                &format!("groups/{}/members", group_id),
                &[("limit", MAX_GROUP_MEMBERS_LIMIT.to_string())],
            )
            .await?;
        debug!(group_id, count = members.len(), "Fetched group members");
        Ok(members)
    }

    async fn fetch_relationships(&self, person_id: i64) -> Result<Vec<Relationship>> {
        self.get(
            &format!("persons/{}/relationships", person_id),
            &[("limit", MAX_PERSONS_LIMIT.to_string())],
        )
        .await
    }

    async fn fetch_group_meetings(
        &self,
        group_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<GroupMeeting>> {
        self.get(
            &format!("groups/{}/meetings", group_id),
            &[
                ("start_date", from.format("%Y-%m-%d").to_string()),
                ("end_date", to.format("%Y-%m-%d").to_string()),
            ],
        )
        .await
    }

    async fn fetch_meeting_members(&self, group_id: i64, meeting_id: i64) -> Result<Vec<MeetingMember>> {
        self.get(
            &format!("groups/{}/meetings/{}/members", group_id, meeting_id),
            &[("limit", MAX_GROUP_MEMBERS_LIMIT.to_string())],
        )
        .await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to download image {}", url))?;

        let response = Self::check_response(response).await?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read image body {}", url))?;
        debug!(url = %url, size = bytes.len(), "Downloaded image");
        Ok(bytes.to_vec())
    }
}
