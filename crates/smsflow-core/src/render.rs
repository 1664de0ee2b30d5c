//! The seam between the step engine and template rendering.
//!
//! Implemented by `smsflow-templates`. The engine checks every template id
//! against [`Renderer::contains`] when it is built, so a table that names an
//! unknown template is rejected at startup instead of on some user's reply.

use thiserror::Error;

use crate::user::{Profile, ProfileField};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
  #[error("template not found: {0:?}")]
  TemplateNotFound(String),

  #[error("template {template:?} needs profile field {field}")]
  MissingField {
    template: String,
    field:    ProfileField,
  },
}

/// Turns a template id plus the user's profile into reply text.
pub trait Renderer: Send + Sync {
  /// Whether `template_id` is registered.
  fn contains(&self, template_id: &str) -> bool;

  fn render(&self, template_id: &str, profile: &Profile) -> Result<String, RenderError>;
}
