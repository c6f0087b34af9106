//! Run configuration for the interpreter.

/// Knobs for a single interpreter run.
///
/// Defaults: panics inside a stage are caught and turned into
/// [`Defect::Panic`](crate::Defect::Panic), and every stage emits a
/// `tracing` debug event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Convert a panicking stage into a defect instead of unwinding through
    /// the caller.
    pub catch_panics: bool,

    /// Emit one debug event per stage.
    pub trace_steps: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            trace_steps: true,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    pub fn with_trace_steps(mut self, trace_steps: bool) -> Self {
        self.trace_steps = trace_steps;
        self
    }
}
