//! Photo-to-poem web service: upload a photo, get a short poem written by
//! Gemini, then save or share the result.

pub mod config;
pub mod data_uri;
pub mod error;
pub mod export;
pub mod gateway;
pub mod presenter;
pub mod session;
pub mod web;

use std::sync::Arc;

use crate::config::Config;
use crate::gateway::{GeminiBackend, PoemGenerationGateway};
use crate::session::SessionRegistry;
use crate::web::AppState;

/// Wires the production collaborators together.
pub fn build_state(config: &Config) -> AppState {
    let backend = Arc::new(GeminiBackend::new(&config.gemini));
    let gateway = PoemGenerationGateway::new(backend, config.generation_timeout);
    AppState {
        sessions: Arc::new(SessionRegistry::new(
            gateway,
            config.session_ttl,
            config.max_sessions,
        )),
    }
}
