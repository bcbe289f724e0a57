use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::state::{
    GenerationFailure, GenerationRequest, GenerationResult, RequestId, SessionState,
};
use crate::data_uri;
use crate::gateway::PoemGenerationGateway;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The request finished while it was still the newest one.
    Completed(SessionState),
    /// A newer submission started first; this result was dropped.
    Superseded { request: RequestId },
}

struct Inner {
    state: SessionState,
    last_issued: RequestId,
}

/// Owns one session's state. All transitions go through here and each one
/// is published to subscribers as a single snapshot.
pub struct SessionController {
    gateway: PoemGenerationGateway,
    inner: Mutex<Inner>,
    events: broadcast::Sender<SessionState>,
}

impl SessionController {
    pub fn new(gateway: PoemGenerationGateway) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                last_issued: RequestId(0),
            }),
            events,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionState> {
        self.events.subscribe()
    }

    /// Runs one validate → generate cycle. A submission made while another
    /// is loading supersedes it; the older result is discarded on arrival.
    pub async fn submit(&self, raw_input: impl Into<String>) -> SubmitOutcome {
        let request = self.begin(raw_input.into());

        let image = match data_uri::validate(&request.raw_input) {
            Ok(image) => image,
            Err(kind) => {
                return self.finish(
                    request.id,
                    GenerationResult::failure(kind, "submitted value is not an image data URI"),
                )
            }
        };

        let result = self.gateway.generate(&image).await;
        self.finish(request.id, result)
    }

    fn begin(&self, raw_input: String) -> GenerationRequest {
        let mut inner = self.lock();
        let id = inner.last_issued.next();
        inner.last_issued = id;

        if let SessionState::Loading { request } = inner.state {
            info!(superseded = %request, by = %id, "new submission while loading");
        }
        self.transition(&mut inner, SessionState::Loading { request: id });

        GenerationRequest { id, raw_input }
    }

    fn finish(&self, id: RequestId, result: GenerationResult) -> SubmitOutcome {
        let mut inner = self.lock();
        let current = matches!(inner.state, SessionState::Loading { request } if request == id);
        if !current {
            debug!(request = %id, newest = %inner.last_issued, "discarding stale result");
            return SubmitOutcome::Superseded { request: id };
        }

        let next = match result {
            GenerationResult::Success(success) => {
                info!(request = %id, chars = success.poem.len(), "poem generated");
                SessionState::Success(Arc::new(success))
            }
            GenerationResult::Failure(failure) => {
                warn!(request = %id, kind = ?failure.kind, detail = %failure.message, "generation failed");
                SessionState::Error(GenerationFailure::new(
                    failure.kind,
                    failure.kind.user_message(),
                ))
            }
        };
        self.transition(&mut inner, next.clone());
        SubmitOutcome::Completed(next)
    }

    // Publishing under the lock keeps event order equal to transition order.
    fn transition(&self, inner: &mut Inner, next: SessionState) {
        debug!(from = inner.state.label(), to = next.label(), "session transition");
        inner.state = next.clone();
        let _ = self.events.send(next);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
