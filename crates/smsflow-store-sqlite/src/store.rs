//! [`SqliteStore`]: the SQLite implementation of [`UserStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use smsflow_core::{
  message::Message,
  state::{SavedState, UserState},
  store::{Turn, UserStore},
  user::User,
};

use crate::{
  encode::{
    encode_dt, encode_position, encode_uuid, field_column, RawMessage, RawState, RawUser,
    MESSAGE_COLUMNS, STATE_COLUMNS, USER_COLUMNS,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An smsflow user store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch at most one user matching `condition`, with `?1` bound to `arg`.
  async fn query_user(&self, condition: &'static str, arg: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {condition}"),
            rusqlite::params![arg],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn find_active_user(&self, phone_number: &str) -> Result<Option<User>> {
    self
      .query_user(
        "phone_number = ?1 AND active = 1 ORDER BY created_at LIMIT 1",
        phone_number.to_owned(),
      )
      .await
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.query_user("user_id = ?1", encode_uuid(user_id)).await
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn latest_state(&self, user_id: Uuid) -> Result<Option<UserState>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawState> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {STATE_COLUMNS} FROM user_states
               WHERE user_id = ?1 ORDER BY seq DESC LIMIT 1"
            ),
            rusqlite::params![id_str],
            RawState::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawState::into_user_state).transpose()
  }

  async fn state_history(&self, user_id: Uuid) -> Result<Vec<SavedState>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawState> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STATE_COLUMNS} FROM user_states WHERE user_id = ?1 ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawState::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawState::into_saved).collect()
  }

  async fn messages(&self, user_id: Uuid) -> Result<Vec<Message>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages WHERE user_id = ?1
           ORDER BY received_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn commit_turn(&self, turn: Turn) -> Result<SavedState> {
    let saved = SavedState {
      state_id:    Uuid::new_v4(),
      user_id:     turn.user.user_id,
      recorded_at: Utc::now(),
      state:       turn.state,
    };

    let user = turn.user;
    let user_id_str = encode_uuid(user.user_id);
    let created_at_str = encode_dt(user.created_at);
    let patch: Vec<(&'static str, String)> = turn
      .patch
      .iter()
      .map(|(field, value)| (field_column(field), value.to_owned()))
      .collect();
    let completed = turn.completed_onboarding;

    let message = turn.message;
    let message_id_str = encode_uuid(message.message_id);
    let received_at_str = encode_dt(message.received_at);
    let sms = message.sms;

    let state_id_str = encode_uuid(saved.state_id);
    let last_question = encode_position(saved.state.last_question);
    let state_message = saved.state.message.clone();
    let state_completed = saved.state.onboarding_completed;
    let recorded_at_str = encode_dt(saved.recorded_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          &format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (user_id) DO NOTHING"
          ),
          rusqlite::params![
            user_id_str,
            user.phone_number,
            user.active,
            user.onboarding_completed,
            user.profile.alias,
            user.profile.age,
            user.profile.postal_code,
            created_at_str,
          ],
        )?;

        // Field-level writes only; concurrent edits to other fields survive.
        for (column, value) in &patch {
          tx.execute(
            &format!("UPDATE users SET {column} = ?1 WHERE user_id = ?2"),
            rusqlite::params![value, user_id_str],
          )?;
        }

        if completed {
          tx.execute(
            "UPDATE users SET onboarding_completed = 1 WHERE user_id = ?1",
            rusqlite::params![user_id_str],
          )?;
        }

        tx.execute(
          &format!(
            "INSERT INTO messages ({MESSAGE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          rusqlite::params![
            message_id_str,
            user_id_str,
            sms.sms_message_sid,
            sms.body,
            sms.sms_status,
            sms.to_number,
            sms.to_postal_code,
            sms.to_city,
            sms.to_country,
            sms.from_number,
            sms.from_postal_code,
            sms.from_city,
            sms.from_country,
            sms.media_url,
            sms.media_content_type,
            received_at_str,
          ],
        )?;

        tx.execute(
          &format!("INSERT INTO user_states ({STATE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          rusqlite::params![
            state_id_str,
            user_id_str,
            last_question,
            state_message,
            state_completed,
            recorded_at_str,
          ],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(saved)
  }
}
