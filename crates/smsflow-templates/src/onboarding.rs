//! Sign-up flow templates.

use smsflow_core::user::{Profile, ProfileField};

use crate::{TemplateFn, require};

pub(crate) const TEMPLATES: &[(&str, TemplateFn)] = &[
  ("welcome_1", welcome_1),
  ("welcome_2", welcome_2),
  ("welcome_3", welcome_3),
  ("welcome_4", welcome_4),
  ("welcome_5", welcome_5),
];

fn welcome_1(_: &Profile) -> Result<String, ProfileField> {
  Ok(
    "Hi! This number sends free info about shelters, showers, food and other \
     services nearby. Reply JOIN to sign up."
      .to_owned(),
  )
}

fn welcome_2(_: &Profile) -> Result<String, ProfileField> {
  Ok("Welcome aboard. What would you like us to call you?".to_owned())
}

fn welcome_3(profile: &Profile) -> Result<String, ProfileField> {
  let alias = require(profile, ProfileField::Alias)?;
  Ok(format!("Nice to meet you, {alias}. How old are you?"))
}

fn welcome_4(profile: &Profile) -> Result<String, ProfileField> {
  let alias = require(profile, ProfileField::Alias)?;
  Ok(format!(
    "Thanks, {alias}. What zip code are you in right now? We use it to find \
     places close to you."
  ))
}

fn welcome_5(profile: &Profile) -> Result<String, ProfileField> {
  let alias = require(profile, ProfileField::Alias)?;
  Ok(format!(
    "You're all set, {alias}! Text us any time. Reply with anything to see \
     the menu."
  ))
}
