//! Use-case orchestration over notes.
//!
//! # Responsibility
//! - Own note instances and route job-layer callbacks to them.
//! - Keep UI code away from the privileged sync capability.

pub mod notes_store;
