//! Resource menu templates.

use smsflow_core::user::{Profile, ProfileField};

use crate::TemplateFn;

pub(crate) const TEMPLATES: &[(&str, TemplateFn)] = &[
  ("entry", entry),
  ("resources_1", resources_1),
  ("resources_shelters_1", resources_shelters_1),
  ("resources_bathrooms_1", resources_bathrooms_1),
];

/// "near 97201" when the postal code is known, "near you" otherwise.
fn near(profile: &Profile) -> String {
  match profile.get(ProfileField::PostalCode) {
    Some(code) if !code.trim().is_empty() => format!("near {}", code.trim()),
    _ => "near you".to_owned(),
  }
}

fn entry(profile: &Profile) -> Result<String, ProfileField> {
  let greeting = match profile.get(ProfileField::Alias) {
    Some(alias) => format!("Hi {alias}! "),
    None => String::new(),
  };
  Ok(format!(
    "{greeting}What do you need? Reply 1 for general resources, 2 for \
     shelters, 3 for public bathrooms."
  ))
}

fn resources_1(profile: &Profile) -> Result<String, ProfileField> {
  Ok(format!(
    "Food banks, clinics and day centers {}: call 211 any time for the \
     full list. Reply with anything to go back to the menu.",
    near(profile)
  ))
}

fn resources_shelters_1(profile: &Profile) -> Result<String, ProfileField> {
  Ok(format!(
    "Shelters with open beds {}: call 211 and ask for tonight's bed count. \
     Reply with anything to go back to the menu.",
    near(profile)
  ))
}

fn resources_bathrooms_1(profile: &Profile) -> Result<String, ProfileField> {
  Ok(format!(
    "Public restrooms {} are usually open at libraries, transit centers and \
     parks during the day. Reply with anything to go back to the menu.",
    near(profile)
  ))
}
