// src/session/mod.rs
//! The wizard state machine.
//!
//! A [`Session`] is a plain value. [`Session::apply`] consumes it together
//! with an [`Event`] and returns the next session plus, at most, one
//! [`Effect`] for the caller to run. Nothing here performs I/O; the
//! [`Studio`] driver executes effects and feeds their results back in.

mod studio;

pub use studio::{Outcome, Studio};

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::entity::{Artifact, InteractionRule, RequiredField, ToolSpecification};
use crate::error::EduforgeError;
use crate::gateway::ImageInput;
use crate::prompt::{PromptCompiler, Request, VisionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    #[default]
    Specify,
    Preview,
    Converse,
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardStep::Specify => write!(f, "specify"),
            WizardStep::Preview => write!(f, "preview"),
            WizardStep::Converse => write!(f, "converse"),
        }
    }
}

/// The kind of external call currently awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    Compose,
    Revise,
    Describe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Pending,
    Applied(PathBuf),
    Failed(String),
}

/// One revise instruction and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub instruction: String,
    pub outcome: TurnOutcome,
}

/// Changes to the in-progress specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecEdit {
    Field(RequiredField, String),
    Extras(String),
    AddRule(InteractionRule),
    ReplaceRule(usize, InteractionRule),
    RemoveRule(usize),
}

#[derive(Debug, Clone)]
pub enum Event {
    Edit(SpecEdit),
    /// Replace the specification wholesale.
    Import(ToolSpecification),
    /// Validate and start a compose round.
    Submit,
    EnterConverse,
    /// Start a revise round with a free-text instruction.
    Instruct(String),
    Back,
    Reset,
    DescribeImage(ImageInput),
    SceneDescribed(String),
    AcceptScene,
    DiscardScene,
    RoundSucceeded(Artifact),
    RoundFailed(String),
}

/// Work the caller must perform after a transition.
#[derive(Debug)]
pub enum Effect {
    Compose(Request),
    Revise(Request),
    Describe(VisionRequest),
    /// The event was refused. A refused `Submit` returns the session to
    /// `Specify`; every other refusal leaves it unchanged.
    Reject(EduforgeError),
}

/// Process-scoped state of one user session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    compiler: PromptCompiler,
    specification: ToolSpecification,
    current_artifact: Option<Artifact>,
    step: WizardStep,
    pending_scene: Option<String>,
    history: Vec<ChatTurn>,
    in_flight: Option<RoundKind>,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PromptCompiler::default())
    }
}

impl Session {
    pub fn new(compiler: PromptCompiler) -> Self {
        Self {
            id: Uuid::new_v4(),
            compiler,
            specification: ToolSpecification::default(),
            current_artifact: None,
            step: WizardStep::Specify,
            pending_scene: None,
            history: Vec::new(),
            in_flight: None,
            last_error: None,
        }
    }

    pub fn with_specification(mut self, specification: ToolSpecification) -> Self {
        self.specification = specification;
        self
    }

    /// Pick up an artifact saved earlier, ready for instructions.
    pub fn resume(mut self, artifact: Artifact) -> Self {
        self.current_artifact = Some(artifact);
        self.step = WizardStep::Converse;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn compiler(&self) -> &PromptCompiler {
        &self.compiler
    }

    pub fn specification(&self) -> &ToolSpecification {
        &self.specification
    }

    pub fn current_artifact(&self) -> Option<&Artifact> {
        self.current_artifact.as_ref()
    }

    pub fn current_location(&self) -> Option<&Path> {
        self.current_artifact.as_ref().map(|a| a.location.as_path())
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn pending_scene(&self) -> Option<&str> {
        self.pending_scene.as_deref()
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn in_flight(&self) -> Option<RoundKind> {
        self.in_flight
    }

    /// Message of the most recent failed round, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Advance the session by one event.
    pub fn apply(mut self, event: Event) -> (Session, Option<Effect>) {
        if self.in_flight.is_some() && blocked_while_in_flight(&event) {
            return (self, Some(Effect::Reject(EduforgeError::RoundInFlight)));
        }

        match event {
            Event::Edit(edit) => match self.edit(edit) {
                Ok(()) => (self, None),
                Err(e) => (self, Some(Effect::Reject(e))),
            },
            Event::Import(specification) => {
                self.specification = specification;
                (self, None)
            }
            Event::Submit => self.submit(),
            Event::EnterConverse => {
                if self.current_artifact.is_none() {
                    return (self, Some(Effect::Reject(EduforgeError::NoArtifact)));
                }
                self.step = WizardStep::Converse;
                (self, None)
            }
            Event::Instruct(instruction) => self.instruct(instruction),
            Event::Back => {
                self.step = match self.step {
                    WizardStep::Converse => WizardStep::Preview,
                    WizardStep::Preview | WizardStep::Specify => WizardStep::Specify,
                };
                (self, None)
            }
            Event::Reset => {
                let fresh = Session {
                    id: self.id,
                    ..Session::new(self.compiler)
                };
                (fresh, None)
            }
            Event::DescribeImage(image) => {
                let request = self.compiler.describe(image);
                self.in_flight = Some(RoundKind::Describe);
                (self, Some(Effect::Describe(request)))
            }
            Event::SceneDescribed(text) => {
                if self.in_flight != Some(RoundKind::Describe) {
                    return self.unexpected("no image description was requested");
                }
                self.in_flight = None;
                self.last_error = None;
                let text = text.trim().to_string();
                self.pending_scene = if text.is_empty() { None } else { Some(text) };
                (self, None)
            }
            Event::AcceptScene => {
                let Some(scene) = self.pending_scene.take() else {
                    return self.unexpected("there is no scene description to accept");
                };
                let initial = &mut self.specification.initial_state;
                if initial.trim().is_empty() {
                    *initial = scene;
                } else {
                    initial.push('\n');
                    initial.push_str(&scene);
                }
                (self, None)
            }
            Event::DiscardScene => {
                self.pending_scene = None;
                (self, None)
            }
            Event::RoundSucceeded(artifact) => self.round_succeeded(artifact),
            Event::RoundFailed(message) => self.round_failed(message),
        }
    }

    fn edit(&mut self, edit: SpecEdit) -> Result<(), EduforgeError> {
        match edit {
            SpecEdit::Field(field, value) => self.specification.set_field(field, value),
            SpecEdit::Extras(extras) => self.specification.set_extras(extras),
            SpecEdit::AddRule(rule) => self.specification.interaction_rules.push(rule),
            SpecEdit::ReplaceRule(index, rule) => {
                let rules = &mut self.specification.interaction_rules;
                let len = rules.len();
                let slot = rules.get_mut(index).ok_or_else(|| no_rule(index, len))?;
                *slot = rule;
            }
            SpecEdit::RemoveRule(index) => {
                let rules = &mut self.specification.interaction_rules;
                if index >= rules.len() {
                    return Err(no_rule(index, rules.len()));
                }
                rules.remove(index);
            }
        }
        Ok(())
    }

    fn submit(mut self) -> (Session, Option<Effect>) {
        if self.step == WizardStep::Converse {
            return self.unexpected("go back to the preview before regenerating");
        }
        match self.compiler.compose(&self.specification) {
            Ok(request) => {
                self.step = WizardStep::Preview;
                self.in_flight = Some(RoundKind::Compose);
                (self, Some(Effect::Compose(request)))
            }
            Err(e) => {
                self.step = WizardStep::Specify;
                (self, Some(Effect::Reject(e)))
            }
        }
    }

    fn instruct(mut self, instruction: String) -> (Session, Option<Effect>) {
        if self.step != WizardStep::Converse {
            return self.unexpected("instructions are only accepted in the conversation step");
        }
        let Some(artifact) = self.current_artifact.as_ref() else {
            return (self, Some(Effect::Reject(EduforgeError::NoArtifact)));
        };
        match self.compiler.revise(&artifact.content, &instruction) {
            Ok(request) => {
                self.history.push(ChatTurn {
                    instruction: instruction.trim().to_string(),
                    outcome: TurnOutcome::Pending,
                });
                self.in_flight = Some(RoundKind::Revise);
                (self, Some(Effect::Revise(request)))
            }
            Err(e) => (self, Some(Effect::Reject(e))),
        }
    }

    fn round_succeeded(mut self, artifact: Artifact) -> (Session, Option<Effect>) {
        match self.in_flight {
            Some(RoundKind::Compose) => {}
            Some(RoundKind::Revise) => {
                if let Some(turn) = self.history.last_mut() {
                    turn.outcome = TurnOutcome::Applied(artifact.location.clone());
                }
            }
            Some(RoundKind::Describe) | None => {
                return self.unexpected("no generation round is in progress");
            }
        }
        self.in_flight = None;
        self.last_error = None;
        self.current_artifact = Some(artifact);
        (self, None)
    }

    fn round_failed(mut self, message: String) -> (Session, Option<Effect>) {
        match self.in_flight {
            Some(RoundKind::Revise) => {
                if let Some(turn) = self.history.last_mut() {
                    turn.outcome = TurnOutcome::Failed(message.clone());
                }
            }
            Some(RoundKind::Compose) | Some(RoundKind::Describe) => {}
            None => return self.unexpected("no round is in progress"),
        }
        self.in_flight = None;
        self.last_error = Some(message);
        (self, None)
    }

    fn unexpected(self, reason: &str) -> (Session, Option<Effect>) {
        let effect = Effect::Reject(EduforgeError::Transition(reason.to_string()));
        (self, Some(effect))
    }
}

/// Shorthand for [`Session::apply`].
pub fn transition(session: Session, event: Event) -> (Session, Option<Effect>) {
    session.apply(event)
}

fn blocked_while_in_flight(event: &Event) -> bool {
    matches!(
        event,
        Event::Submit
            | Event::Instruct(_)
            | Event::DescribeImage(_)
            | Event::Import(_)
            | Event::Reset
    )
}

fn no_rule(index: usize, len: usize) -> EduforgeError {
    EduforgeError::Transition(format!(
        "there is no rule {} (the list has {})",
        index + 1,
        len
    ))
}
