//! Self-correcting scenario generation.
//!
//! A session drafts a scenario through a provider, validates it, and feeds
//! validation errors back for correction until the candidate is valid or the
//! retry budget is spent.

mod orchestrator;
mod session;

pub use orchestrator::{GenerationError, GenerationOrchestrator};
pub use session::{
    GenerationAttempt, GenerationSession, SessionRequest, SessionResult, SessionState,
};
