//! Reply templates for smsflow.
//!
//! Every template is a plain function of the user's [`Profile`], registered
//! under its id in [`Templates`]. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use smsflow_core::{render::Renderer, user::Profile};
//! use smsflow_templates::Templates;
//!
//! let templates = Templates::builtin();
//! let text = templates.render("welcome_1", &Profile::default()).unwrap();
//! println!("{text}");
//! ```

mod chat;
mod onboarding;

use std::{collections::BTreeMap, fmt};

use smsflow_core::{
  render::{RenderError, Renderer},
  user::{Profile, ProfileField},
};

/// A template body. On failure it names the profile field it could not do
/// without.
pub type TemplateFn = fn(&Profile) -> Result<String, ProfileField>;

/// Text sent whenever a request cannot be handled, and served on the
/// provider's fallback route.
pub fn failure_message() -> String {
  "Sorry, something went wrong on our end. Please try again in a few minutes.".to_owned()
}

/// Read a profile field a template cannot render without.
pub(crate) fn require(profile: &Profile, field: ProfileField) -> Result<&str, ProfileField> {
  profile.get(field).ok_or(field)
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// An explicit `template id → body` registry.
#[derive(Clone, Default)]
pub struct Templates {
  entries: BTreeMap<&'static str, TemplateFn>,
}

impl fmt::Debug for Templates {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.ids()).finish()
  }
}

impl Templates {
  pub fn new() -> Self { Self::default() }

  /// All templates used by the built-in step tables.
  pub fn builtin() -> Self {
    let mut templates = Self::new();
    for &(id, body) in onboarding::TEMPLATES.iter().chain(chat::TEMPLATES) {
      templates.register(id, body);
    }
    templates
  }

  /// Register `body` under `id`, replacing any previous body.
  pub fn register(&mut self, id: &'static str, body: TemplateFn) -> &mut Self {
    self.entries.insert(id, body);
    self
  }

  pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.entries.keys().copied()
  }
}

impl Renderer for Templates {
  fn contains(&self, template_id: &str) -> bool { self.entries.contains_key(template_id) }

  fn render(&self, template_id: &str, profile: &Profile) -> Result<String, RenderError> {
    let body = self
      .entries
      .get(template_id)
      .ok_or_else(|| RenderError::TemplateNotFound(template_id.to_owned()))?;
    body(profile).map_err(|field| RenderError::MissingField {
      template: template_id.to_owned(),
      field,
    })
  }
}
