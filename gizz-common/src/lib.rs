//! # Gizz Quiz Common Library
//!
//! Shared code for the quiz service and its tests:
//! - Error type
//! - TOML bootstrap configuration
//! - Event types (QuizEvent enum) and the EventBus
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
