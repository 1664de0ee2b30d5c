//! Step tables: the guided conversations, expressed as data.
//!
//! A table is an ordered list of steps. Each step names the template to send,
//! optionally the profile field the user's *reply* to that template fills in,
//! and where the conversation goes next depending on that reply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  state::Position,
  user::ProfileField,
};

// ─── Transitions ─────────────────────────────────────────────────────────────

/// Where a step leads, keyed by the exact text of the user's reply.
///
/// In data form this is a single map; the reserved key `"all"` is an
/// unconditional transition that wins over every reply key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
  from = "BTreeMap<String, Position>",
  into = "BTreeMap<String, Position>"
)]
pub struct Transitions {
  all:     Option<Position>,
  replies: BTreeMap<String, Position>,
}

impl Transitions {
  pub const ALL_KEY: &'static str = "all";

  /// Move to `target` whatever the reply.
  pub fn always(target: Position) -> Self {
    Self { all: Some(target), replies: BTreeMap::new() }
  }

  /// Move according to the exact reply text.
  pub fn on_replies<'a>(pairs: impl IntoIterator<Item = (&'a str, Position)>) -> Self {
    pairs
      .into_iter()
      .map(|(key, target)| (key.to_owned(), target))
      .collect::<BTreeMap<_, _>>()
      .into()
  }

  /// Resolve the next position for `body`.
  ///
  /// Order: the unconditional target, then an exact (case-sensitive) reply
  /// match, then the table's entry step. An unrecognised reply is never an
  /// error.
  pub fn resolve(&self, body: &str) -> Position {
    if let Some(target) = self.all {
      return target;
    }
    self.replies.get(body).copied().unwrap_or(Position::ENTRY)
  }

  /// Every `(key, target)` pair, the unconditional one reported as `"all"`.
  pub fn targets(&self) -> impl Iterator<Item = (&str, Position)> {
    self
      .all
      .map(|target| (Self::ALL_KEY, target))
      .into_iter()
      .chain(self.replies.iter().map(|(key, target)| (key.as_str(), *target)))
  }
}

impl From<BTreeMap<String, Position>> for Transitions {
  fn from(mut map: BTreeMap<String, Position>) -> Self {
    let all = map.remove(Self::ALL_KEY);
    Self { all, replies: map }
  }
}

impl From<Transitions> for BTreeMap<String, Position> {
  fn from(transitions: Transitions) -> Self {
    let mut map = transitions.replies;
    if let Some(target) = transitions.all {
      map.insert(Transitions::ALL_KEY.to_owned(), target);
    }
    map
  }
}

// ─── Steps ───────────────────────────────────────────────────────────────────

/// One step of a guided conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
  /// Template rendered when the user arrives at this step.
  pub template: String,
  /// Profile field set from the user's reply to this step, if any.
  #[serde(default)]
  pub field:    Option<ProfileField>,
  pub next:     Transitions,
}

impl StepDefinition {
  pub fn new(
    template: impl Into<String>,
    field: Option<ProfileField>,
    next: Transitions,
  ) -> Self {
    Self { template: template.into(), field, next }
  }
}

/// Transition keys of one step that differ only by ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseVariants {
  pub table: String,
  pub step:  usize,
  pub keys:  Vec<String>,
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// The data form of a [`StepTable`], before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawStepTable {
  name:  String,
  steps: Vec<StepDefinition>,
}

/// A validated, immutable, ordered list of steps.
///
/// Never empty, and every transition points at one of its own steps or at
/// [`Position::Complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepTable {
  name:  String,
  steps: Vec<StepDefinition>,
}

impl StepTable {
  pub fn new(name: impl Into<String>, steps: Vec<StepDefinition>) -> Result<Self> {
    let table = Self { name: name.into(), steps };
    table.validate()?;
    Ok(table)
  }

  /// Parse and validate a table from its JSON data form:
  /// `{"name": "...", "steps": [{"template": "...", "field": "alias", "next": {"all": 2}}]}`.
  pub fn from_json(json: &str) -> Result<Self> {
    let raw: RawStepTable = serde_json::from_str(json)?;
    Self::new(raw.name, raw.steps)
  }

  fn validate(&self) -> Result<()> {
    if self.steps.is_empty() {
      return Err(Error::EmptyTable(self.name.clone()));
    }
    for (index, step) in self.steps.iter().enumerate() {
      for (key, target) in step.next.targets() {
        if let Position::Step(target_index) = target
          && target_index >= self.steps.len()
        {
          return Err(Error::InvalidTransition {
            table:  self.name.clone(),
            step:   index,
            key:    key.to_owned(),
            target: target.to_raw(),
          });
        }
      }
    }
    Ok(())
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn len(&self) -> usize { self.steps.len() }

  pub fn is_empty(&self) -> bool { self.steps.is_empty() }

  pub fn steps(&self) -> &[StepDefinition] { &self.steps }

  /// The step at `index`.
  pub fn lookup(&self, index: usize) -> Result<&StepDefinition> {
    self.steps.get(index).ok_or_else(|| Error::IndexOutOfRange {
      index: i64::try_from(index).unwrap_or(i64::MAX),
      len:   self.steps.len(),
    })
  }

  /// Step 0, where every phase starts.
  pub fn entry(&self) -> &StepDefinition {
    // Validation guarantees at least one step.
    &self.steps[0]
  }

  /// The final step. A completing turn repeats it as its reply.
  pub fn last(&self) -> &StepDefinition {
    &self.steps[self.steps.len() - 1]
  }

  /// Steps whose reply keys collide when compared case-insensitively. Such
  /// keys almost always mean case-insensitive matching was intended; matching
  /// stays exact, callers should surface these for correction.
  pub fn case_variant_keys(&self) -> Vec<CaseVariants> {
    let mut flagged = Vec::new();
    for (index, step) in self.steps.iter().enumerate() {
      let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
      for key in step.next.replies.keys() {
        groups
          .entry(key.to_ascii_lowercase())
          .or_default()
          .push(key.clone());
      }
      flagged.extend(
        groups
          .into_values()
          .filter(|keys| keys.len() > 1)
          .map(|keys| CaseVariants { table: self.name.clone(), step: index, keys }),
      );
    }
    flagged
  }

  // ── Built-in tables ───────────────────────────────────────────────────────

  /// First-contact sign-up: asks for a JOIN keyword, then alias, age and
  /// postal code.
  pub fn onboarding() -> Self {
    use Position::{Complete, Step};
    Self {
      name:  "onboarding".to_owned(),
      steps: vec![
        StepDefinition::new(
          "welcome_1",
          None,
          Transitions::on_replies([("JOIN", Step(1)), ("Join", Step(1)), ("join", Step(1))]),
        ),
        StepDefinition::new("welcome_2", Some(ProfileField::Alias), Transitions::always(Step(2))),
        StepDefinition::new("welcome_3", Some(ProfileField::Age), Transitions::always(Step(3))),
        StepDefinition::new(
          "welcome_4",
          Some(ProfileField::PostalCode),
          Transitions::always(Step(4)),
        ),
        StepDefinition::new("welcome_5", None, Transitions::always(Complete)),
      ],
    }
  }

  /// The steady-state resource menu.
  pub fn chat() -> Self {
    use Position::{Complete, Step};
    Self {
      name:  "chat".to_owned(),
      steps: vec![
        StepDefinition::new(
          "entry",
          None,
          Transitions::on_replies([("1", Step(1)), ("2", Step(2)), ("3", Step(3))]),
        ),
        StepDefinition::new("resources_1", None, Transitions::always(Complete)),
        StepDefinition::new("resources_shelters_1", None, Transitions::always(Complete)),
        StepDefinition::new("resources_bathrooms_1", None, Transitions::always(Complete)),
      ],
    }
  }
}
