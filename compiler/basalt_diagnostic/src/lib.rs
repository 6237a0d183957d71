//! Diagnostic reporting for the Basalt front end.
//!
//! One `DiagnosticSink` per parser instance: it counts errors and
//! warnings, forwards published events to an optional callback, and
//! routes everything raised inside a suppression scope (speculative
//! parsing) to a separate suppressed counter instead.

mod diagnostic;
pub mod emit;
mod sink;

pub use diagnostic::{Diagnostic, ErrorCode, Severity};
pub use sink::{DiagnosticSink, MessageCallback, MAX_SUPPRESSED_ERRORS};
