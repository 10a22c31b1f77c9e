// MISOUL - mental-health support chat backend
// Library exports

pub mod config;
pub mod crisis;
pub mod dialogue;
pub mod emotion;
pub mod errors;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod retrieval;
pub mod segmenter;
pub mod server;

pub use dialogue::{ChatService, TurnOutcome, TurnRequest};
pub use errors::ChatError;
