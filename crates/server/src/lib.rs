//! Server crate for the painting selection service.
//!
//! This crate contains the orchestrator that decides between the
//! recommendation and random paths, the service wrapping it with exclusion
//! tracking, and the HTTP routes in front of both.

pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod routes;
pub mod service;
pub mod state;

pub use config::{ExhaustionPolicy, SelectionConfig, ServiceArgs};
pub use error::{ApiError, SelectionError};
pub use orchestrator::SelectionOrchestrator;
pub use service::{SelectionService, WorkerStatus};
pub use state::AppState;
