use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id: String,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
  pub access_token: String,
  pub user: AuthUser,
}

/// Shared handle to whoever is signed in. Cloning shares the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
  inner: Arc<RwLock<Option<AuthSession>>>,
}

impl SessionHandle {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn signed_in(session: AuthSession) -> Self {
    let handle = Self::new();
    handle.set(session);
    handle
  }

  pub fn set(&self, session: AuthSession) {
    *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
  }

  pub fn sign_out(&self) {
    *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
  }

  pub fn current(&self) -> Option<AuthSession> {
    self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn user_id(&self) -> Option<String> {
    self.current().map(|s| s.user.id)
  }

  pub fn access_token(&self) -> Option<String> {
    self.current().map(|s| s.access_token)
  }
}
