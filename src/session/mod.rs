mod controller;
mod registry;
mod state;

pub use controller::{SessionController, SubmitOutcome};
pub use registry::{SessionId, SessionRegistry};
pub use state::{
    GenerationFailure, GenerationRequest, GenerationResult, PoemSuccess, RequestId, SessionState,
};
