//! Device-local key/value storage
//!
//! The active workout lives in a handful of string slots. Multi-key writes
//! and removals are atomic, and multi-key reads come from a single snapshot,
//! so a reader never sees one slot updated without its partner.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Storage unavailable: {0}")]
  Unavailable(String),
}

/// ---------------------------------------------------------------------------
/// Storage Interface
/// ---------------------------------------------------------------------------

#[async_trait]
pub trait KeyValueStore: Send + Sync {
  /// Read several keys from one snapshot. Values come back in `keys` order.
  async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError>;

  /// Write all entries or none of them
  async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

  async fn remove(&self, key: &str) -> Result<(), StorageError>;

  /// Remove all keys or none of them
  async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// ---------------------------------------------------------------------------
/// SQLite Backend
/// ---------------------------------------------------------------------------

pub struct SqliteKeyValueStore {
  pool: SqlitePool,
}

impl SqliteKeyValueStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
  async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
    if keys.is_empty() {
      return Ok(vec![]);
    }

    // One statement, so both slots are read from the same snapshot
    let placeholders = vec!["?"; keys.len()].join(", ");
    let sql = format!("SELECT key, value FROM kv_store WHERE key IN ({})", placeholders);

    let mut query = sqlx::query_as::<_, (String, String)>(&sql);
    for key in keys {
      query = query.bind(*key);
    }

    let rows = query.fetch_all(&self.pool).await?;
    let found: HashMap<String, String> = rows.into_iter().collect();

    Ok(keys.iter().map(|key| found.get(*key).cloned()).collect())
  }

  async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
    let now = Utc::now();
    let mut tx = self.pool.begin().await?;

    for (key, value) in entries {
      sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
          value = excluded.value,
          updated_at = excluded.updated_at
        "#,
      )
      .bind(*key)
      .bind(value.as_str())
      .bind(now)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM kv_store WHERE key = ?1")
      .bind(key)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
    let mut tx = self.pool.begin().await?;

    for key in keys {
      sqlx::query("DELETE FROM kv_store WHERE key = ?1")
        .bind(*key)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// In-Memory Backend
/// ---------------------------------------------------------------------------

/// Used when the device database cannot be opened. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryKeyValueStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
  async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
    let entries = self.entries();
    Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
  }

  async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
    let mut stored = self.entries();
    for (key, value) in entries {
      stored.insert(key.to_string(), value.clone());
    }
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.entries().remove(key);
    Ok(())
  }

  async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
    let mut stored = self.entries();
    for key in keys {
      stored.remove(*key);
    }
    Ok(())
  }
}
