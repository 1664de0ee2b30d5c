//! Conversation state snapshots.
//!
//! A user's state history is an append-only log. The most recent snapshot is
//! the current state; advancing never rewrites an older one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Position ────────────────────────────────────────────────────────────────

/// Where a user stands within the active step table.
///
/// Serialised as a plain integer, with `-1` meaning [`Position::Complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Position {
  /// An index into the active table.
  Step(usize),
  /// The current phase has finished.
  Complete,
}

impl Position {
  pub const COMPLETE_RAW: i64 = -1;

  pub const ENTRY: Self = Self::Step(0);

  /// Decode a raw stored index. `-1` is the completion sentinel; any other
  /// negative value is out of range for every table.
  pub fn from_raw(raw: i64) -> Result<Self> {
    if raw == Self::COMPLETE_RAW {
      return Ok(Self::Complete);
    }
    usize::try_from(raw)
      .map(Self::Step)
      .map_err(|_| Error::IndexOutOfRange { index: raw, len: 0 })
  }

  pub fn to_raw(self) -> i64 {
    match self {
      Self::Step(index) => i64::try_from(index).unwrap_or(i64::MAX),
      Self::Complete => Self::COMPLETE_RAW,
    }
  }
}

impl From<Position> for i64 {
  fn from(position: Position) -> Self { position.to_raw() }
}

impl TryFrom<i64> for Position {
  type Error = Error;

  fn try_from(raw: i64) -> Result<Self> { Self::from_raw(raw) }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Step(index) => write!(f, "step {index}"),
      Self::Complete => f.write_str("complete"),
    }
  }
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// One snapshot of a user's conversation state.
///
/// The default value stands in for a user with no history yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
  /// `None` until the first reply has been sent.
  pub last_question:        Option<Position>,
  /// The text rendered for `last_question`.
  pub message:              String,
  pub onboarding_completed: bool,
}

/// A [`UserState`] as recorded in a user's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedState {
  pub state_id:    Uuid,
  pub user_id:     Uuid,
  pub recorded_at: DateTime<Utc>,
  #[serde(flatten)]
  pub state:       UserState,
}
