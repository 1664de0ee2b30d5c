//! The `UserStore` trait and the unit of work it commits.
//!
//! The trait is implemented by storage backends (e.g. `smsflow-store-sqlite`).
//! The webhook server depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  engine::Advance,
  message::Message,
  state::{SavedState, UserState},
  user::{ProfilePatch, User},
};

// ─── Unit of work ────────────────────────────────────────────────────────────

/// Everything one inbound message changes, committed all-or-nothing.
#[derive(Debug, Clone)]
pub struct Turn {
  /// The sender. Inserted if it has never been persisted.
  pub user:                 User,
  pub message:              Message,
  pub patch:                ProfilePatch,
  /// Appended to the user's history.
  pub state:                UserState,
  pub completed_onboarding: bool,
}

impl Turn {
  pub fn new(user: User, message: Message, advance: Advance) -> Self {
    Self {
      user,
      message,
      patch: advance.patch,
      state: advance.state,
      completed_onboarding: advance.completed_onboarding,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an smsflow storage backend.
///
/// Messages and state snapshots are append-only. The only in-place updates
/// are field-level writes to a user's profile and onboarding flag.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait UserStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// The active user registered under `phone_number`, if any.
  fn find_active_user<'a>(
    &'a self,
    phone_number: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// The most recent snapshot in the user's history, if any.
  fn latest_state(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserState>, Self::Error>> + Send + '_;

  /// The user's full state history, oldest first.
  fn state_history(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SavedState>, Self::Error>> + Send + '_;

  /// Every message the user has sent, oldest first.
  fn messages(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist `turn` atomically and return the appended snapshot.
  fn commit_turn(
    &self,
    turn: Turn,
  ) -> impl Future<Output = Result<SavedState, Self::Error>> + Send + '_;
}
