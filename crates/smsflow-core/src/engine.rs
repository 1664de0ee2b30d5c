//! [`StepEngine`]: advances a user's conversation by one reply.
//!
//! The engine is a pure function over the current [`UserState`], the user's
//! [`Profile`] and the reply text. It never touches storage; the caller
//! persists the returned patch and appends the returned state.

use serde::Serialize;

use crate::{
  Error, Result,
  render::Renderer,
  state::{Position, UserState},
  step::StepTable,
  user::{Profile, ProfilePatch},
};

/// Which table drives the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  Onboarding,
  Chat,
}

impl Phase {
  pub fn of(state: &UserState) -> Self {
    if state.onboarding_completed { Self::Chat } else { Self::Onboarding }
  }
}

/// The outcome of one [`StepEngine::advance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advance {
  /// The snapshot to append to the user's history.
  pub state:                UserState,
  /// Profile writes taken from the reply; empty for most steps.
  pub patch:                ProfilePatch,
  /// The template that produced `state.message`.
  pub template:             String,
  /// Whether this reply finished onboarding.
  pub completed_onboarding: bool,
}

/// The step-state-machine over an onboarding table and a chat table.
#[derive(Debug)]
pub struct StepEngine<R> {
  onboarding: StepTable,
  chat:       StepTable,
  renderer:   R,
}

impl<R: Renderer> StepEngine<R> {
  /// Build an engine, failing if either table names a template `renderer`
  /// does not know.
  pub fn new(onboarding: StepTable, chat: StepTable, renderer: R) -> Result<Self> {
    for table in [&onboarding, &chat] {
      if let Some(step) = table
        .steps()
        .iter()
        .find(|step| !renderer.contains(&step.template))
      {
        return Err(Error::TemplateNotFound(step.template.clone()));
      }
    }
    Ok(Self { onboarding, chat, renderer })
  }

  /// The built-in onboarding and chat tables.
  pub fn builtin(renderer: R) -> Result<Self> {
    Self::new(StepTable::onboarding(), StepTable::chat(), renderer)
  }

  pub fn table(&self, phase: Phase) -> &StepTable {
    match phase {
      Phase::Onboarding => &self.onboarding,
      Phase::Chat => &self.chat,
    }
  }

  /// Advance `current` by the reply `body`.
  ///
  /// - No position yet (or a finished position once chatting): enter the
  ///   active table at step 0 without reading the reply.
  /// - Otherwise: copy `body` into the current step's field, if it has one,
  ///   and follow its transitions.
  /// - Finishing onboarding records [`Position::Complete`], marks the user
  ///   onboarded and repeats the last onboarding step, which asks for any
  ///   reply. That reply is not read; it opens the chat menu. Finishing a
  ///   chat step loops back to the chat entry step.
  pub fn advance(
    &self,
    current: &UserState,
    profile: &Profile,
    body: &str,
  ) -> Result<Advance> {
    let phase = Phase::of(current);
    let table = self.table(phase);
    let mut patch = ProfilePatch::default();

    let next = match (current.last_question, phase) {
      (None, _) | (Some(Position::Complete), Phase::Chat) => Position::ENTRY,
      (Some(Position::Complete), Phase::Onboarding) => {
        return Err(Error::IndexOutOfRange {
          index: Position::COMPLETE_RAW,
          len:   table.len(),
        });
      }
      (Some(Position::Step(index)), _) => {
        let step = table.lookup(index)?;
        if let Some(field) = step.field {
          patch.set(field, body);
        }
        match (step.next.resolve(body), phase) {
          (Position::Complete, Phase::Chat) => Position::ENTRY,
          (resolved, _) => resolved,
        }
      }
    };

    let completed_onboarding = phase == Phase::Onboarding && next == Position::Complete;

    let template = match next {
      Position::Step(index) => &table.lookup(index)?.template,
      Position::Complete => &self.onboarding.last().template,
    };

    let mut patched = profile.clone();
    patch.apply(&mut patched);
    let message = self.renderer.render(template, &patched)?;

    Ok(Advance {
      state: UserState {
        last_question: Some(next),
        message,
        onboarding_completed: current.onboarding_completed || completed_onboarding,
      },
      patch,
      template: template.clone(),
      completed_onboarding,
    })
  }
}
