//! Remote store for finished workouts
//!
//! Completed workouts are appended to a hosted document database through a
//! PostgREST-style HTTP API. The same service may still hold a per-user
//! "current workout" row written by older app versions; it is deleted on a
//! best-effort basis whenever the local active workout is cleared.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

use crate::models::CompletedWorkoutRecord;
use crate::session::SessionHandle;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const WORKOUTS_TABLE: &str = "workouts";
const LEGACY_ACTIVE_TABLE: &str = "current_workouts";
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
  pub base_url: String,
  pub api_key: String,
}

impl RemoteConfig {
  pub fn from_env() -> Result<Self, SinkError> {
    Ok(Self {
      base_url: env::var("WORKOUT_API_URL")
        .map_err(|_| SinkError::MissingConfig("WORKOUT_API_URL".into()))?,
      api_key: env::var("WORKOUT_API_KEY")
        .map_err(|_| SinkError::MissingConfig("WORKOUT_API_KEY".into()))?,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
  #[error("Not signed in")]
  NotAuthenticated,

  #[error("Remote write failed: {0}")]
  RemoteWrite(String),

  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Invalid URL: {0}")]
  InvalidUrl(String),
}

impl From<reqwest::Error> for SinkError {
  fn from(err: reqwest::Error) -> Self {
    SinkError::RemoteWrite(err.to_string())
  }
}

impl Serialize for SinkError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Sink Interface
/// ---------------------------------------------------------------------------

#[async_trait]
pub trait CompletedWorkoutSink: Send + Sync {
  /// Persist a finished workout for `user_id`, returning the new record's id
  async fn commit(
    &self,
    record: &CompletedWorkoutRecord,
    user_id: Option<&str>,
  ) -> Result<String, SinkError>;

  /// Delete any legacy server-side active workout. Nothing to delete is success.
  async fn delete_legacy_active_record(&self, user_id: &str) -> Result<(), SinkError>;
}

/// ---------------------------------------------------------------------------
/// REST Implementation
/// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WorkoutRow<'a> {
  user_id: &'a str,
  #[serde(flatten)]
  record: &'a CompletedWorkoutRecord,
}

#[derive(Debug, Deserialize)]
struct InsertedRow {
  id: serde_json::Value,
}

pub struct RestWorkoutSink {
  client: Client,
  config: RemoteConfig,
  session: SessionHandle,
}

impl RestWorkoutSink {
  pub fn new(config: RemoteConfig, session: SessionHandle) -> Result<Self, SinkError> {
    Url::parse(&config.base_url).map_err(|e| SinkError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

    let client = Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .build()?;

    Ok(Self {
      client,
      config,
      session,
    })
  }

  fn table_url(&self, table: &str) -> Result<Url, SinkError> {
    let raw = format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table);
    Url::parse(&raw).map_err(|e| SinkError::InvalidUrl(format!("{}: {}", raw, e)))
  }

  /// The signed-in user's token when there is one, the anon key otherwise
  fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
    let bearer = self
      .session
      .access_token()
      .unwrap_or_else(|| self.config.api_key.clone());

    request
      .header("apikey", &self.config.api_key)
      .header("Authorization", format!("Bearer {}", bearer))
  }
}

#[async_trait]
impl CompletedWorkoutSink for RestWorkoutSink {
  async fn commit(
    &self,
    record: &CompletedWorkoutRecord,
    user_id: Option<&str>,
  ) -> Result<String, SinkError> {
    let user_id = user_id.ok_or(SinkError::NotAuthenticated)?;
    let url = self.table_url(WORKOUTS_TABLE)?;

    let response = self
      .authorized(self.client.post(url))
      .header("Prefer", "return=representation")
      .json(&WorkoutRow { user_id, record })
      .send()
      .await?;

    if response.status() == StatusCode::UNAUTHORIZED {
      return Err(SinkError::NotAuthenticated);
    }

    if !response.status().is_success() {
      let status = response.status();
      let error_text = response.text().await.unwrap_or_default();
      return Err(SinkError::RemoteWrite(format!(
        "Workout insert failed ({}): {}",
        status, error_text
      )));
    }

    let rows: Vec<InsertedRow> = response.json().await?;
    let id = rows
      .into_iter()
      .next()
      .map(|row| match row.id {
        serde_json::Value::String(id) => id,
        other => other.to_string(),
      })
      .ok_or_else(|| SinkError::RemoteWrite("Insert returned no rows".into()))?;

    tracing::info!(workout_id = %id, total_sets = record.total_sets, "Completed workout saved");
    Ok(id)
  }

  async fn delete_legacy_active_record(&self, user_id: &str) -> Result<(), SinkError> {
    let mut url = self.table_url(LEGACY_ACTIVE_TABLE)?;
    url
      .query_pairs_mut()
      .append_pair("user_id", &format!("eq.{}", user_id));

    let response = self.authorized(self.client.delete(url)).send().await?;

    match response.status() {
      // Already gone
      StatusCode::NOT_FOUND => Ok(()),
      StatusCode::UNAUTHORIZED => Err(SinkError::NotAuthenticated),
      status if status.is_success() => Ok(()),
      status => {
        let error_text = response.text().await.unwrap_or_default();
        Err(SinkError::RemoteWrite(format!(
          "Legacy workout delete failed ({}): {}",
          status, error_text
        )))
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
