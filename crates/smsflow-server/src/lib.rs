//! SMS webhook server for smsflow.
//!
//! Exposes an axum [`Router`] that receives the provider's inbound-SMS
//! webhook, advances the sender's conversation with a [`StepEngine`] and
//! replies with the rendered text. Backed by any [`UserStore`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod webhook;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use smsflow_core::{engine::StepEngine, store::UserStore};
use smsflow_templates::Templates;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use handlers::{failed, health, inbound};
use locks::SenderLocks;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  #[serde(default)]
  pub auth_username:      Option<String>,
  /// argon2 PHC string; see `server --hash-password`.
  #[serde(default)]
  pub auth_password_hash: Option<String>,
}

impl ServerConfig {
  /// Basic auth credentials, if both halves are configured.
  pub fn auth(&self) -> Option<AuthConfig> {
    match (&self.auth_username, &self.auth_password_hash) {
      (Some(username), Some(password_hash)) => Some(AuthConfig {
        username:      username.clone(),
        password_hash: password_hash.clone(),
      }),
      _ => None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: UserStore> {
  pub store:  Arc<S>,
  pub engine: Arc<StepEngine<Templates>>,
  /// `None` leaves the webhook routes open.
  pub auth:   Option<Arc<AuthConfig>>,
  pub locks:  SenderLocks,
}

impl<S: UserStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      engine: self.engine.clone(),
      auth:   self.auth.clone(),
      locks:  self.locks.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the webhook server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: UserStore + 'static,
{
  Router::new()
    .route("/health",     get(health::handler))
    .route("/sms/inbound", post(inbound::handler::<S>))
    .route("/sms/failed",  get(failed::handler).post(failed::handler))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use smsflow_core::{
    message::{InboundSms, Message},
    state::{Position, UserState},
    store::Turn,
    user::{ProfilePatch, User},
  };
  use smsflow_store_sqlite::SqliteStore;
  use smsflow_templates::failure_message;
  use tower::ServiceExt as _;

  const SENDER: &str = "+15035550100";

  async fn make_state(password: Option<&str>) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let hash  = password.map(|password| {
      let salt = SaltString::generate(&mut OsRng);
      Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
    });

    let config = ServerConfig {
      host:               "127.0.0.1".to_string(),
      port:               5000,
      store_path:         PathBuf::from(":memory:"),
      auth_username:      hash.as_ref().map(|_| "twilio".to_string()),
      auth_password_hash: hash,
    };

    AppState {
      store:  Arc::new(store),
      engine: Arc::new(StepEngine::builtin(Templates::builtin()).unwrap()),
      auth:   config.auth().map(Arc::new),
      locks:  SenderLocks::new(),
    }
  }

  /// `application/x-www-form-urlencoded` encoding of one value.
  fn urlencode(value: &str) -> String {
    let mut out = String::new();
    for byte in value.bytes() {
      match byte {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
          out.push(byte as char)
        }
        b' ' => out.push('+'),
        _ => out.push_str(&format!("%{byte:02X}")),
      }
    }
    out
  }

  fn webhook_body(from: &str, body: &str) -> String {
    [
      ("SmsMessageSid", "SM0123456789abcdef"),
      ("Body", body),
      ("SmsStatus", "received"),
      ("To", "+15005550006"),
      ("From", from),
      ("FromCity", "PORTLAND"),
      ("FromZip", "97201"),
    ]
    .iter()
    .map(|(k, v)| format!("{k}={}", urlencode(v)))
    .collect::<Vec<_>>()
    .join("&")
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn post_form(
    state: AppState<SqliteStore>,
    uri:   &str,
    form:  String,
    auth:  Option<&str>,
  ) -> Response {
    let mut builder = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = builder.body(Body::from(form)).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn text_of(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  /// Send `body` from `from` and return the reply, asserting success.
  async fn text(state: &AppState<SqliteStore>, from: &str, body: &str) -> String {
    let resp = post_form(state.clone(), "/sms/inbound", webhook_body(from, body), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/plain"), "Content-Type: {ct}");
    text_of(resp).await
  }

  async fn positions(state: &AppState<SqliteStore>, from: &str) -> Vec<Option<Position>> {
    let user = state.store.find_active_user(from).await.unwrap().unwrap();
    state
      .store
      .state_history(user.user_id)
      .await
      .unwrap()
      .into_iter()
      .map(|saved| saved.state.last_question)
      .collect()
  }

  // ── Health ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_returns_true_without_auth() {
    let state = make_state(Some("secret")).await;
    let req   = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp  = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text_of(resp).await, "true");
  }

  // ── Conversation ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_contact_gets_welcome() {
    let state = make_state(None).await;
    let reply = text(&state, SENDER, "hi").await;
    assert!(reply.contains("JOIN"), "reply: {reply}");
    assert_eq!(positions(&state, SENDER).await, vec![Some(Position::Step(0))]);
  }

  #[tokio::test]
  async fn unknown_keyword_repeats_welcome() {
    let state = make_state(None).await;
    let first = text(&state, SENDER, "hi").await;
    let again = text(&state, SENDER, "what is this").await;
    assert_eq!(first, again);
    assert_eq!(
      positions(&state, SENDER).await,
      vec![Some(Position::Step(0)), Some(Position::Step(0))]
    );
  }

  #[tokio::test]
  async fn full_onboarding_then_chat_menu() {
    let state = make_state(None).await;

    text(&state, SENDER, "hi").await;
    text(&state, SENDER, "JOIN").await;
    let asks_age = text(&state, SENDER, "Sam").await;
    assert!(asks_age.contains("Sam"), "reply: {asks_age}");
    text(&state, SENDER, "29").await;
    text(&state, SENDER, "97201").await;
    let done = text(&state, SENDER, "ok").await;
    assert!(done.contains("see the menu"), "reply: {done}");
    assert!(!done.contains("Reply 1"), "reply: {done}");

    let user = state.store.find_active_user(SENDER).await.unwrap().unwrap();
    assert!(user.onboarding_completed);
    assert_eq!(user.profile.alias.as_deref(), Some("Sam"));
    assert_eq!(user.profile.age.as_deref(), Some("29"));
    assert_eq!(user.profile.postal_code.as_deref(), Some("97201"));

    let history = state.store.state_history(user.user_id).await.unwrap();
    assert_eq!(history.len(), 6);
    let last = &history[5].state;
    assert_eq!(last.last_question, Some(Position::Complete));
    assert!(last.onboarding_completed);
    assert!(!history[4].state.onboarding_completed);

    let menu = text(&state, SENDER, "sure").await;
    assert!(menu.contains("Reply 1"), "reply: {menu}");
    let shelters = text(&state, SENDER, "2").await;
    assert!(shelters.contains("97201"), "reply: {shelters}");
    let back = text(&state, SENDER, "thanks").await;
    assert_eq!(back, menu);

    let chat = positions(&state, SENDER).await;
    assert_eq!(
      &chat[6..],
      &[
        Some(Position::Step(0)),
        Some(Position::Step(2)),
        Some(Position::Step(0)),
      ]
    );
    assert_eq!(state.store.messages(user.user_id).await.unwrap().len(), 9);
  }

  #[tokio::test]
  async fn senders_have_separate_conversations() {
    let state = make_state(None).await;
    text(&state, SENDER, "hi").await;
    text(&state, SENDER, "JOIN").await;
    let other = text(&state, "+15035550101", "JOIN").await;
    assert!(other.contains("JOIN"), "reply: {other}");
    assert_eq!(positions(&state, "+15035550101").await, vec![Some(Position::Step(0))]);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn simultaneous_messages_from_one_sender_are_serialised() {
    let state = make_state(None).await;

    let mut tasks = Vec::new();
    for _ in 0..5 {
      let state = state.clone();
      tasks.push(tokio::spawn(async move {
        post_form(state, "/sms/inbound", webhook_body(SENDER, "JOIN"), None)
          .await
          .status()
      }));
    }
    for task in tasks {
      assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let expected: Vec<_> = (0..5).map(|n| Some(Position::Step(n))).collect();
    assert_eq!(positions(&state, SENDER).await, expected);
  }

  // ── Failures ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_sender_is_a_failure_reply() {
    let state = make_state(None).await;
    let resp  = post_form(state, "/sms/inbound", "Body=hi".to_string(), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(text_of(resp).await, failure_message());
  }

  #[tokio::test]
  async fn corrupt_history_is_a_server_error_and_writes_nothing() {
    let state = make_state(None).await;
    let user  = User::new(SENDER);
    let sms   = InboundSms {
      body:        "hi".into(),
      from_number: SENDER.into(),
      ..InboundSms::default()
    };
    state
      .store
      .commit_turn(Turn {
        message:              Message::new(user.user_id, sms),
        user,
        patch:                ProfilePatch::default(),
        state:                UserState {
          last_question:        Some(Position::Step(42)),
          message:              String::new(),
          onboarding_completed: false,
        },
        completed_onboarding: false,
      })
      .await
      .unwrap();

    let resp = post_form(state.clone(), "/sms/inbound", webhook_body(SENDER, "JOIN"), None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text_of(resp).await, failure_message());

    assert_eq!(positions(&state, SENDER).await, vec![Some(Position::Step(42))]);
    let user = state.store.find_active_user(SENDER).await.unwrap().unwrap();
    assert_eq!(state.store.messages(user.user_id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn failed_route_serves_failure_message() {
    let state = make_state(None).await;
    let resp  = post_form(state.clone(), "/sms/failed", webhook_body(SENDER, "hi"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text_of(resp).await, failure_message());

    let req  = Request::builder().uri("/sms/failed").body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Auth ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_webhook_returns_401() {
    let state = make_state(Some("secret")).await;
    let resp  = post_form(state.clone(), "/sms/inbound", webhook_body(SENDER, "hi"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    assert!(state.store.find_active_user(SENDER).await.unwrap().is_none());

    let bad  = auth_header("twilio", "wrong");
    let resp = post_form(state, "/sms/failed", String::new(), Some(&bad)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_webhook_is_handled() {
    let state = make_state(Some("secret")).await;
    let auth  = auth_header("twilio", "secret");
    let resp  = post_form(state, "/sms/inbound", webhook_body(SENDER, "hi"), Some(&auth)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text_of(resp).await.contains("JOIN"));
  }

  #[test]
  fn auth_requires_both_halves() {
    let mut config = ServerConfig {
      host:               "127.0.0.1".to_string(),
      port:               5000,
      store_path:         PathBuf::from(":memory:"),
      auth_username:      Some("twilio".to_string()),
      auth_password_hash: None,
    };
    assert!(config.auth().is_none());
    config.auth_password_hash = Some("$argon2id$v=19$stub".to_string());
    assert_eq!(config.auth().unwrap().username, "twilio");
  }
}
