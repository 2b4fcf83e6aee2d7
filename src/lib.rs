//! Compile-time generation of `Validate()` methods from member annotations.
//!
//! A pass runs over a declaration snapshot: candidates are collected, checked
//! for structural preconditions, their member constraints extracted, and a
//! short-circuiting boolean expression is emitted as a partial declaration.
pub mod check;
pub mod cli;
pub mod codegen;
pub mod collect;
pub mod config;
pub mod constraint;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod generator;
pub mod jq_exec;
pub mod model;
pub mod path_de;
pub mod symbols;

pub use config::GeneratorConfig;
pub use generator::{Cancellation, Generator, GeneratorOutput};
pub use model::Compilation;
