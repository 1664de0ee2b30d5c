//! The provider's fallback URL.
//!
//! When `/sms/inbound` answers with a non-2xx status the provider calls this
//! route instead, and relays its body to the sender.

use axum::{http::StatusCode, response::Response};
use smsflow_templates::failure_message;

use crate::{auth::Authenticated, handlers::text_response};

/// `GET|POST /sms/failed`
pub async fn handler(_: Authenticated) -> Response {
  text_response(StatusCode::OK, failure_message())
}
