//! Users and the profile fields the step flow fills in.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A profile field that a step may populate from the user's reply.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
  Alias,
  Age,
  PostalCode,
}

impl ProfileField {
  pub const ALL: [Self; 3] = [Self::Alias, Self::Age, Self::PostalCode];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Alias => "alias",
      Self::Age => "age",
      Self::PostalCode => "postal_code",
    }
  }
}

impl fmt::Display for ProfileField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProfileField {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|field| field.as_str() == s)
      .ok_or_else(|| format!("unknown profile field: {s:?}"))
  }
}

/// The mutable profile attached to a user. Values are stored verbatim as the
/// user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub alias:       Option<String>,
  pub age:         Option<String>,
  pub postal_code: Option<String>,
}

impl Profile {
  pub fn get(&self, field: ProfileField) -> Option<&str> {
    match field {
      ProfileField::Alias => self.alias.as_deref(),
      ProfileField::Age => self.age.as_deref(),
      ProfileField::PostalCode => self.postal_code.as_deref(),
    }
  }

  pub fn set(&mut self, field: ProfileField, value: String) {
    let slot = match field {
      ProfileField::Alias => &mut self.alias,
      ProfileField::Age => &mut self.age,
      ProfileField::PostalCode => &mut self.postal_code,
    };
    *slot = Some(value);
  }
}

/// Field writes produced by one advance of the step engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfilePatch(BTreeMap<ProfileField, String>);

impl ProfilePatch {
  pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
    self.0.insert(field, value.into());
  }

  pub fn get(&self, field: ProfileField) -> Option<&str> {
    self.0.get(&field).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (ProfileField, &str)> {
    self.0.iter().map(|(field, value)| (*field, value.as_str()))
  }

  /// Write every patched field into `profile`.
  pub fn apply(&self, profile: &mut Profile) {
    for (field, value) in self.iter() {
      profile.set(field, value.to_owned());
    }
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A person texting the service, identified by phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:              Uuid,
  pub phone_number:         String,
  pub active:               bool,
  pub onboarding_completed: bool,
  pub profile:              Profile,
  pub created_at:           DateTime<Utc>,
}

impl User {
  /// A fresh, not yet persisted user for a first-time sender.
  pub fn new(phone_number: impl Into<String>) -> Self {
    Self {
      user_id:              Uuid::new_v4(),
      phone_number:         phone_number.into(),
      active:               true,
      onboarding_completed: false,
      profile:              Profile::default(),
      created_at:           Utc::now(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_names_round_trip_through_from_str() {
    for field in ProfileField::ALL {
      assert_eq!(field.as_str().parse::<ProfileField>(), Ok(field));
    }
    assert!("lat".parse::<ProfileField>().is_err());
  }

  #[test]
  fn patch_apply_overwrites_only_patched_fields() {
    let mut profile = Profile {
      alias:       Some("Old".into()),
      age:         Some("40".into()),
      postal_code: None,
    };
    let mut patch = ProfilePatch::default();
    patch.set(ProfileField::Alias, "Sam");

    patch.apply(&mut profile);

    assert_eq!(profile.alias.as_deref(), Some("Sam"));
    assert_eq!(profile.age.as_deref(), Some("40"));
    assert_eq!(profile.postal_code, None);
  }

  #[test]
  fn patch_serializes_with_field_names() {
    let mut patch = ProfilePatch::default();
    patch.set(ProfileField::PostalCode, "97201");
    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json, serde_json::json!({ "postal_code": "97201" }));
  }
}
