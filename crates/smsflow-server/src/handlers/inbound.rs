//! `POST /sms/inbound`: one conversation turn per inbound SMS.

use axum::{
  Form,
  extract::{State, rejection::FormRejection},
  http::StatusCode,
  response::Response,
};
use smsflow_core::{
  message::Message,
  state::UserState,
  store::{Turn, UserStore},
  user::User,
};

use crate::{
  AppState,
  auth::Authenticated,
  error::Error,
  handlers::text_response,
  webhook::WebhookForm,
};

/// Resolve the sender, advance their conversation by the message body and
/// reply with the rendered text.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  _: Authenticated,
  form: Result<Form<WebhookForm>, FormRejection>,
) -> Result<Response, Error>
where
  S: UserStore + 'static,
{
  let Form(form) = form.map_err(|e| Error::BadRequest(e.body_text()))?;
  let sms = form.into_inbound()?;

  let _turn = state.locks.lock(&sms.from_number).await;

  let user = match state
    .store
    .find_active_user(&sms.from_number)
    .await
    .map_err(Error::store)?
  {
    Some(user) => user,
    None => {
      tracing::info!(sender = %sms.from_number, "first message from new sender");
      User::new(sms.from_number.clone())
    }
  };

  let current = state
    .store
    .latest_state(user.user_id)
    .await
    .map_err(Error::store)?
    .unwrap_or_else(|| UserState {
      onboarding_completed: user.onboarding_completed,
      ..UserState::default()
    });

  let advance = state.engine.advance(&current, &user.profile, &sms.body)?;
  let reply = advance.state.message.clone();

  tracing::info!(
    sid       = sms.sms_message_sid.as_deref().unwrap_or("-"),
    sender    = %sms.from_number,
    from      = ?current.last_question,
    to        = ?advance.state.last_question,
    template  = %advance.template,
    completed = advance.completed_onboarding,
    "advanced conversation"
  );

  let message = Message::new(user.user_id, sms);
  state
    .store
    .commit_turn(Turn::new(user, message, advance))
    .await
    .map_err(Error::store)?;

  Ok(text_response(StatusCode::OK, reply))
}
