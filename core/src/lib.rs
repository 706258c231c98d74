//! # Scan Orchestration Core
//!
//! Plans target ranges, drives an external scan engine across them,
//! aggregates the results into a ranked risk summary, dispatches
//! notifications and optionally repeats the whole thing on a schedule.
//!
//! The two external collaborators, the scan engine and the message
//! relay, sit behind the [`capability`] traits; everything in this crate
//! is testable against in-memory fakes.

pub mod capability;
pub mod discovery;
pub mod notify;
pub mod orchestrator;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod store;

pub use capability::{CapabilityError, Messenger, ScanCapability};
pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};
