//! Progress reporting (§9): interactive output is an injected interface so the
//! exporter and importer never block on terminal I/O directly. A no-op sink backs
//! tests and non-interactive library use.

use console::{style, Term};

/// Receives phase/step notifications from the exporter and importer orchestrators.
/// Implementations must not fail the operation they're reporting on; every method
/// returns nothing and swallows its own I/O errors.
pub trait ProgressSink: Send + Sync {
    fn phase_start(&self, _phase: &str) {}
    fn phase_done(&self, _phase: &str) {}
    fn step(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

/// Discards every notification. Used by library callers and tests that don't
/// care about human-readable output.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {}

/// Writes phase and step notifications to a terminal, styled the way
/// `sherpack-kube`'s `ProgressReporter` styles resource states.
pub struct TerminalProgress {
    term: Term,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn phase_start(&self, phase: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {phase}", style("▶").cyan()));
    }

    fn phase_done(&self, phase: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {phase}", style("✓").green()));
    }

    fn step(&self, message: &str) {
        let _ = self.term.write_line(&format!("  {message}"));
    }

    fn warn(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {message}", style("!").yellow()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_progress_accepts_every_call_without_panicking() {
        let sink = NoopProgress;
        sink.phase_start("discover");
        sink.step("fetching providers.pkg.crossplane.io");
        sink.phase_done("discover");
        sink.warn("crossplane version mismatch");
    }
}
