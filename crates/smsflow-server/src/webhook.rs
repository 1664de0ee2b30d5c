//! Decoding of the provider's inbound-SMS webhook form.

use serde::Deserialize;
use smsflow_core::message::InboundSms;

use crate::error::Error;

/// The form fields the provider posts for one inbound SMS. Fields we do not
/// use (`AccountSid`, `NumMedia`, …) are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebhookForm {
  pub message_sid:         Option<String>,
  pub sms_message_sid:     Option<String>,
  #[serde(default)]
  pub body:                String,
  pub sms_status:          Option<String>,
  pub to:                  Option<String>,
  pub to_zip:              Option<String>,
  pub to_city:             Option<String>,
  pub to_country:          Option<String>,
  pub from:                Option<String>,
  pub from_zip:            Option<String>,
  pub from_city:           Option<String>,
  pub from_country:        Option<String>,
  #[serde(rename = "MediaUrl0")]
  pub media_url:           Option<String>,
  #[serde(rename = "MediaContentType0")]
  pub media_content_type:  Option<String>,
}

/// Treat empty form values as absent.
fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

impl WebhookForm {
  /// Convert into an [`InboundSms`]. The body is kept verbatim; a missing
  /// sender is rejected.
  pub fn into_inbound(self) -> Result<InboundSms, Error> {
    let from_number = non_empty(self.from)
      .ok_or_else(|| Error::BadRequest("webhook has no From number".to_owned()))?;

    Ok(InboundSms {
      sms_message_sid: non_empty(self.sms_message_sid).or(non_empty(self.message_sid)),
      body: self.body,
      sms_status: non_empty(self.sms_status),
      to_number: non_empty(self.to),
      to_postal_code: non_empty(self.to_zip),
      to_city: non_empty(self.to_city),
      to_country: non_empty(self.to_country),
      from_number,
      from_postal_code: non_empty(self.from_zip),
      from_city: non_empty(self.from_city),
      from_country: non_empty(self.from_country),
      media_url: non_empty(self.media_url),
      media_content_type: non_empty(self.media_content_type),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_provider_fields() {
    let form = WebhookForm {
      message_sid: Some("MM1".into()),
      sms_message_sid: Some("SM1".into()),
      body: "  Sam ".into(),
      from: Some("+15035550100".into()),
      from_zip: Some("97201".into()),
      to_city: Some("".into()),
      ..WebhookForm::default()
    };

    let sms = form.into_inbound().unwrap();
    assert_eq!(sms.sms_message_sid.as_deref(), Some("SM1"));
    assert_eq!(sms.body, "  Sam ");
    assert_eq!(sms.from_number, "+15035550100");
    assert_eq!(sms.from_postal_code.as_deref(), Some("97201"));
    assert_eq!(sms.to_city, None);
  }

  #[test]
  fn message_sid_backs_up_sms_message_sid() {
    let form = WebhookForm {
      message_sid: Some("SM2".into()),
      from: Some("+15035550100".into()),
      ..WebhookForm::default()
    };
    assert_eq!(form.into_inbound().unwrap().sms_message_sid.as_deref(), Some("SM2"));
  }

  #[test]
  fn missing_sender_is_rejected() {
    let form = WebhookForm { body: "hi".into(), ..WebhookForm::default() };
    assert!(matches!(form.into_inbound(), Err(Error::BadRequest(_))));

    let blank = WebhookForm { from: Some(String::new()), ..WebhookForm::default() };
    assert!(matches!(blank.into_inbound(), Err(Error::BadRequest(_))));
  }
}
