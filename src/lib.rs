//! Operator console core for the spot instance optimizer backend.
//!
//! Every view is an owned state object behind a `tokio::sync::watch` channel;
//! renderers subscribe, actions go through the workflow types.

pub mod agents;
pub mod api;
pub mod clients;
pub mod config;
pub mod dashboard;
pub mod helpers;
pub mod models;
pub mod refresh;
pub mod shell;
pub mod switching;
pub mod types;

pub use types::{ConsoleError, FailureKind};
