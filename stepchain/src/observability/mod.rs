//! Diagnostic output for `log()` steps.

mod line;
mod sink;

#[cfg(test)]
pub use sink::MockDiagnosticSink;
pub use line::{DiagnosticLine, PipelineKind, INITIAL_MARKER};
pub use sink::{CollectingSink, DiagnosticSink, NoOpSink, TracingSink};
