//! The assembly pipeline: stores, selection, expansion, assembly, cleanup.

pub mod assembler;
pub mod cleaner;
pub mod config;
pub mod pipeline;
pub mod selector;
pub mod simple;
pub mod store;
pub mod wildcard;
