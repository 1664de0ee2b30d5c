pub mod failed;
pub mod health;
pub mod inbound;

use axum::{
  body::Body,
  http::{HeaderValue, StatusCode, header},
  response::Response,
};

pub(crate) const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// A plain-text reply the SMS provider relays to the sender as-is.
pub(crate) fn text_response(status: StatusCode, body: String) -> Response {
  let mut res = Response::new(Body::from(body));
  *res.status_mut() = status;
  res.headers_mut().insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static(CONTENT_TYPE_TEXT),
  );
  res
}
