//! Shared domain types
//!
//! Typed boundary payloads (redesigned from the loose JSON the observed
//! clients send) and the identifiers/timing parameters the core runs on.

pub mod billing;
pub mod endpoint;
pub mod ids;
pub mod sampling;
pub mod task;
