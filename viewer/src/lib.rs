//! tracescope: agent telemetry trace viewer
//!
//! Ingests raw telemetry records (tracing spans and free-form runtime
//! logs), reconstructs the causal span hierarchy and conversational
//! structure per trace, and renders a deduplicated hierarchical view.

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
