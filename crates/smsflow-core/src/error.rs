//! Error types for `smsflow-core`.

use thiserror::Error;

use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored or requested step index does not exist in the active table.
  #[error("step index {index} is out of range for a table of {len} steps")]
  IndexOutOfRange { index: i64, len: usize },

  #[error("step table {0:?} has no steps")]
  EmptyTable(String),

  #[error(
    "step {step} of table {table:?} maps {key:?} to {target}, which is not a \
     step of that table"
  )]
  InvalidTransition {
    table:  String,
    step:   usize,
    key:    String,
    target: i64,
  },

  #[error("template not found: {0:?}")]
  TemplateNotFound(String),

  #[error("template {template:?} needs profile field {field:?}")]
  TemplateRender { template: String, field: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl From<RenderError> for Error {
  fn from(err: RenderError) -> Self {
    match err {
      RenderError::TemplateNotFound(id) => Self::TemplateNotFound(id),
      RenderError::MissingField { template, field } => Self::TemplateRender {
        template,
        field: field.as_str().to_owned(),
      },
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
