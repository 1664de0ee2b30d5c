//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Positions are nullable integers with `-1` for
//! "complete".

use chrono::{DateTime, Utc};
use smsflow_core::{
  message::{InboundSms, Message},
  state::{Position, SavedState, UserState},
  user::{Profile, ProfileField, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Position ────────────────────────────────────────────────────────────────

pub fn encode_position(position: Option<Position>) -> Option<i64> {
  position.map(Position::to_raw)
}

pub fn decode_position(raw: Option<i64>) -> Result<Option<Position>> {
  Ok(raw.map(Position::from_raw).transpose()?)
}

// ─── ProfileField ────────────────────────────────────────────────────────────

/// The `users` column backing `field`.
pub fn field_column(field: ProfileField) -> &'static str {
  match field {
    ProfileField::Alias => "alias",
    ProfileField::Age => "age",
    ProfileField::PostalCode => "postal_code",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str =
  "user_id, phone_number, active, onboarding_completed, alias, age, postal_code, created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:              String,
  pub phone_number:         String,
  pub active:               bool,
  pub onboarding_completed: bool,
  pub alias:                Option<String>,
  pub age:                  Option<String>,
  pub postal_code:          Option<String>,
  pub created_at:           String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:              row.get(0)?,
      phone_number:         row.get(1)?,
      active:               row.get(2)?,
      onboarding_completed: row.get(3)?,
      alias:                row.get(4)?,
      age:                  row.get(5)?,
      postal_code:          row.get(6)?,
      created_at:           row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:              decode_uuid(&self.user_id)?,
      phone_number:         self.phone_number,
      active:               self.active,
      onboarding_completed: self.onboarding_completed,
      profile:              Profile {
        alias:       self.alias,
        age:         self.age,
        postal_code: self.postal_code,
      },
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawMessage::from_row`].
pub const MESSAGE_COLUMNS: &str = "message_id, user_id, sms_message_sid, body, sms_status, \
   to_number, to_postal_code, to_city, to_country, from_number, from_postal_code, \
   from_city, from_country, media_url, media_content_type, received_at";

/// Raw values read directly from a `messages` row.
pub struct RawMessage {
  pub message_id:  String,
  pub user_id:     String,
  pub sms:         InboundSms,
  pub received_at: String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:  row.get(0)?,
      user_id:     row.get(1)?,
      sms:         InboundSms {
        sms_message_sid:    row.get(2)?,
        body:               row.get(3)?,
        sms_status:         row.get(4)?,
        to_number:          row.get(5)?,
        to_postal_code:     row.get(6)?,
        to_city:            row.get(7)?,
        to_country:         row.get(8)?,
        from_number:        row.get(9)?,
        from_postal_code:   row.get(10)?,
        from_city:          row.get(11)?,
        from_country:       row.get(12)?,
        media_url:          row.get(13)?,
        media_content_type: row.get(14)?,
      },
      received_at: row.get(15)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id:  decode_uuid(&self.message_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      sms:         self.sms,
      received_at: decode_dt(&self.received_at)?,
    })
  }
}

/// Column list matching [`RawState::from_row`].
pub const STATE_COLUMNS: &str =
  "state_id, user_id, last_question, message, onboarding_completed, recorded_at";

/// Raw values read directly from a `user_states` row.
pub struct RawState {
  pub state_id:             String,
  pub user_id:              String,
  pub last_question:        Option<i64>,
  pub message:              String,
  pub onboarding_completed: bool,
  pub recorded_at:          String,
}

impl RawState {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      state_id:             row.get(0)?,
      user_id:              row.get(1)?,
      last_question:        row.get(2)?,
      message:              row.get(3)?,
      onboarding_completed: row.get(4)?,
      recorded_at:          row.get(5)?,
    })
  }

  pub fn into_user_state(self) -> Result<UserState> {
    Ok(UserState {
      last_question:        decode_position(self.last_question)?,
      message:              self.message,
      onboarding_completed: self.onboarding_completed,
    })
  }

  pub fn into_saved(self) -> Result<SavedState> {
    let state_id = decode_uuid(&self.state_id)?;
    let user_id = decode_uuid(&self.user_id)?;
    let recorded_at = decode_dt(&self.recorded_at)?;
    Ok(SavedState {
      state_id,
      user_id,
      recorded_at,
      state: self.into_user_state()?,
    })
  }
}
