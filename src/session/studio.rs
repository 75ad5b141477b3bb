// src/session/studio.rs
use std::path::PathBuf;

use tracing::{info, info_span, warn};

use super::{Effect, Event, Session};
use crate::entity::Artifact;
use crate::error::{EduforgeError, Result};
use crate::gateway::GenerationBackend;
use crate::normalize::normalize;
use crate::prompt::{Mode, Request, VisionRequest};
use crate::storage::ArtifactStore;
use crate::warnings::{self, Warning};

/// What a dispatched event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The session changed without any external call.
    Updated,
    /// A compose or revise round saved a new artifact.
    Generated(Artifact),
    /// An image description is waiting to be accepted.
    Described(String),
}

/// Runs a [`Session`] against a backend and an artifact store.
///
/// Rounds are strictly sequential: `dispatch` blocks until the backend
/// answers, so two rounds can never race on the current artifact.
pub struct Studio<B> {
    session: Session,
    backend: B,
    store: ArtifactStore,
    warnings: Vec<Warning>,
}

impl<B: GenerationBackend> Studio<B> {
    pub fn new(session: Session, backend: B, store: ArtifactStore) -> Self {
        Self {
            session,
            backend,
            store,
            warnings: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Warnings gathered since the last call.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Apply one event and run whatever round it starts.
    ///
    /// Refused events and failed rounds come back as errors; in both cases
    /// the current artifact is exactly what it was before the call.
    pub fn dispatch(&mut self, event: Event) -> Result<Outcome> {
        match self.feed(event) {
            None => Ok(Outcome::Updated),
            Some(Effect::Reject(e)) => Err(e),
            Some(Effect::Compose(request)) => {
                self.warnings
                    .extend(warnings::check_specification(self.session.specification()));
                self.run_text_round(request)
            }
            Some(Effect::Revise(request)) => self.run_text_round(request),
            Some(Effect::Describe(request)) => self.run_describe_round(request),
        }
    }

    /// Archive the session's current artifact.
    pub fn archive(&self) -> Result<PathBuf> {
        let location = self.session.current_location().ok_or_else(|| {
            EduforgeError::NotFound("nothing has been generated yet".to_string())
        })?;
        self.store.archive(location)
    }

    fn feed(&mut self, event: Event) -> Option<Effect> {
        let session = std::mem::take(&mut self.session);
        let (session, effect) = session.apply(event);
        self.session = session;
        effect
    }

    fn run_text_round(&mut self, request: Request) -> Result<Outcome> {
        let span = info_span!("round", session = %self.session.id(), mode = %request.mode);
        let _enter = span.enter();

        self.warnings.extend(warnings::check_request(
            &request,
            self.session.compiler().max_request_bytes,
        ));

        let title = match request.mode {
            Mode::Compose => self.session.specification().title.clone(),
            Mode::Revise => self
                .session
                .current_artifact()
                .map(|a| a.title.clone())
                .unwrap_or_default(),
        };

        info!(backend = self.backend.name(), bytes = request.size(), "dispatching");
        let result = self
            .backend
            .complete(&request)
            .map(|raw| normalize(&raw))
            .and_then(|content| self.store.save(&content, &title));

        match result {
            Ok(artifact) => {
                info!(location = %artifact.location.display(), "round complete");
                self.feed(Event::RoundSucceeded(artifact.clone()));
                Ok(Outcome::Generated(artifact))
            }
            Err(e) => {
                warn!(error = %e, "round failed");
                self.feed(Event::RoundFailed(e.to_string()));
                Err(e)
            }
        }
    }

    fn run_describe_round(&mut self, request: VisionRequest) -> Result<Outcome> {
        let span = info_span!("round", session = %self.session.id(), mode = "describe");
        let _enter = span.enter();

        match self.backend.describe_image(&request) {
            Ok(text) => {
                self.feed(Event::SceneDescribed(text));
                let scene = self.session.pending_scene().unwrap_or_default().to_string();
                Ok(Outcome::Described(scene))
            }
            Err(e) => {
                warn!(error = %e, "image description failed");
                self.feed(Event::RoundFailed(e.to_string()));
                Err(e)
            }
        }
    }
}
