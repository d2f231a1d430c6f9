/// HTTP health, readiness and liveness probes
pub mod health;
/// Periodic cleanup of expired wizard state
pub mod wizard_sweeper;
