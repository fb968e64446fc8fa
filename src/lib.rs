//! Prompt Engine — reproducible randomized prompt assembly.
//!
//! Combines a library of named snippet categories with a named template
//! and a caller-supplied seed to produce a single prompt string, plus a
//! human-readable log of what each field resolved to.

pub mod core;
pub mod error;
pub mod schema;

pub use crate::core::pipeline::{Generation, PromptEngine, PromptRequest};
pub use crate::error::EngineError;
pub use crate::schema::directive::Directive;
