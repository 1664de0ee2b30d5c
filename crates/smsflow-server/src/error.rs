//! Error types and axum `IntoResponse` implementation.
//!
//! Every failure other than authentication is answered with the same fixed
//! text, so the provider relays something sensible to the user. The full
//! error is logged here and nowhere else.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use smsflow_templates::failure_message;
use thiserror::Error;

use crate::handlers::text_response;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("engine error: {0}")]
  Engine(#[from] smsflow_core::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        tracing::debug!("rejected unauthenticated webhook call");
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"smsflow\""),
        );
        res
      }
      Error::BadRequest(ref msg) => {
        tracing::warn!(reason = %msg, "rejected malformed webhook call");
        text_response(StatusCode::BAD_REQUEST, failure_message())
      }
      Error::Engine(_) | Error::Store(_) => {
        tracing::error!(error = ?self, "failed to handle message: {self}");
        text_response(StatusCode::INTERNAL_SERVER_ERROR, failure_message())
      }
    }
  }
}
