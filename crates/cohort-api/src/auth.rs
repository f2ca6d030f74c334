//! Bearer-token sessions, request extractors, and the admin gate.
//!
//! Clients hold an opaque random token. The server only keeps the SHA-256
//! digest of each token, mapped to the [`Session`] it identifies.

use std::{
  collections::HashMap,
  sync::{PoisonError, RwLock},
};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use cohort_core::{participant::Participant, session::Session, store::CohortStore};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Registry ────────────────────────────────────────────────────────────────

/// All live sessions, keyed by token digest.
#[derive(Debug, Default)]
pub struct SessionRegistry {
  sessions: RwLock<HashMap<String, Session>>,
}

fn digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

impl SessionRegistry {
  pub fn new() -> Self { Self::default() }

  /// Start a session for `participant_id` and return its client token.
  pub fn issue(&self, participant_id: Uuid) -> String {
    let mut raw = [0u8; 32];
    OsRng.fill_bytes(&mut raw);
    let token = B64.encode(raw);

    self
      .sessions
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(digest(&token), Session::new(participant_id));
    token
  }

  pub fn get(&self, token: &str) -> Option<Session> {
    self
      .sessions
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&digest(token))
      .cloned()
  }

  /// End the session; returns whether it existed.
  pub fn revoke(&self, token: &str) -> bool {
    self
      .sessions
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&digest(token))
      .is_some()
  }

  /// End every session belonging to `participant_id`.
  pub fn revoke_participant(&self, participant_id: Uuid) {
    self
      .sessions
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .retain(|_, s| !s.owns(participant_id));
  }

  /// Mark the session as admin-unlocked; returns whether it existed.
  pub fn unlock_admin(&self, token: &str) -> bool {
    match self
      .sessions
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .get_mut(&digest(token))
    {
      Some(session) => {
        session.unlock_admin();
        true
      }
      None => false,
    }
  }
}

// ─── Admin gate ──────────────────────────────────────────────────────────────

/// Verifies the shared admin password against an argon2 PHC string.
#[derive(Clone)]
pub struct AdminGate {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`. An empty or
  /// malformed hash disables the admin view.
  pub password_hash: String,
}

impl AdminGate {
  pub fn verify(&self, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
      return false;
    };
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(ApiError::Unauthorized)
}

/// An authenticated request: the session plus a fresh copy of its
/// participant's profile.
#[derive(Debug, Clone)]
pub struct CurrentSession {
  pub token:       String,
  pub session:     Session,
  pub participant: Participant,
}

impl<S> FromRequestParts<ApiState<S>> for CurrentSession
where
  S: CohortStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?.to_owned();
    let session = state.sessions.get(&token).ok_or(ApiError::Unauthorized)?;

    let participant = match state
      .store
      .get_participant(session.participant_id)
      .await
      .map_err(ApiError::store)?
    {
      Some(p) => p,
      None => {
        // Deleted by an administrator while logged in.
        state.sessions.revoke(&token);
        return Err(ApiError::Unauthorized);
      }
    };

    Ok(Self { token, session, participant })
  }
}

/// A session that has unlocked the admin view.
#[derive(Debug, Clone)]
pub struct AdminSession(pub CurrentSession);

impl<S> FromRequestParts<ApiState<S>> for AdminSession
where
  S: CohortStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let current = CurrentSession::from_request_parts(parts, state).await?;
    if !current.session.admin_unlocked {
      return Err(ApiError::Forbidden("admin view is locked".to_owned()));
    }
    Ok(Self(current))
  }
}
