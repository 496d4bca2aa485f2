use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;

/// Shared warning sink for one conversion run. Data-integrity and structural
/// problems are logged and counted here so the caller can tell a clean run
/// from one that completed with warnings; fatal conditions use
/// `anyhow::Error` instead and never pass through this type.
#[derive(Default)]
pub struct Diagnostics {
    warnings: AtomicUsize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        warn!("{}", message.as_ref());
        self.warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn outcome(&self) -> Outcome {
        match self.warning_count() {
            0 => Outcome::Clean,
            n => Outcome::CompletedWithWarnings(n),
        }
    }
}

/// How a conversion run ended, short of a fatal error.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Clean,
    CompletedWithWarnings(usize),
}

impl Outcome {
    /// Process exit code for drivers: 0 for a clean run, 2 when artifacts
    /// were produced but warnings occurred. Fatal errors are reported via
    /// `anyhow::Error` and conventionally map to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Clean => 0,
            Outcome::CompletedWithWarnings(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_warnings() {
        let diag = Diagnostics::new();
        assert_eq!(diag.outcome(), Outcome::Clean);
        diag.warn("first");
        diag.warn("second");
        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.outcome(), Outcome::CompletedWithWarnings(2));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Outcome::Clean.exit_code(), 0);
        assert_eq!(Outcome::CompletedWithWarnings(3).exit_code(), 2);
    }
}
