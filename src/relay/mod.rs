//! HTTP relay that forwards prompt tasks to an orchestrator and streams
//! progress back to the caller as Server-Sent Events.

pub mod executor;
pub mod handlers;
pub mod routes;
pub mod state;

pub use executor::{EchoExecutor, TaskExecutor};
pub use routes::create_router;
pub use state::{RelayState, TaskRecord, TaskStatus};
