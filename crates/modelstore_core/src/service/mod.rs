//! Core use-case services.
//!
//! # Responsibility
//! - Adapt repository results to the contract editors program against.
//! - Keep editor-facing code independent of the storage backend.

pub mod communication;
