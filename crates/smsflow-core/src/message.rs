//! Inbound SMS records.
//!
//! A message is immutable once recorded. Each webhook call produces exactly
//! one, owned by the user who sent it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The provider-supplied fields of one inbound SMS, before it is attached to
/// a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundSms {
  pub sms_message_sid:    Option<String>,
  pub body:               String,
  pub sms_status:         Option<String>,
  pub to_number:          Option<String>,
  pub to_postal_code:     Option<String>,
  pub to_city:            Option<String>,
  pub to_country:         Option<String>,
  pub from_number:        String,
  pub from_postal_code:   Option<String>,
  pub from_city:          Option<String>,
  pub from_country:       Option<String>,
  pub media_url:          Option<String>,
  pub media_content_type: Option<String>,
}

/// A recorded inbound SMS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id:  Uuid,
  pub user_id:     Uuid,
  #[serde(flatten)]
  pub sms:         InboundSms,
  pub received_at: DateTime<Utc>,
}

impl Message {
  /// Stamp `sms` as received now on behalf of `user_id`.
  pub fn new(user_id: Uuid, sms: InboundSms) -> Self {
    Self {
      message_id: Uuid::new_v4(),
      user_id,
      sms,
      received_at: Utc::now(),
    }
  }

  pub fn body(&self) -> &str { &self.sms.body }
}
