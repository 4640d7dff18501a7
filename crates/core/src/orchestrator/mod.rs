//! Lego job orchestrator.
//!
//! Drives one request through the remote workflow:
//!
//! 1. validate the request
//! 2. copy the upload into a scoped temp file
//! 3. probe its duration
//! 4. claim GPU tokens from the queue service
//! 5. load the model, 6. submit, 7. poll, 8. fetch the result
//! 9. unload the model and release the tokens (always, once claimed)
//! 10. remove the temp file (always)

mod config;
mod lease;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::JobOrchestrator;
pub use types::JobError;
