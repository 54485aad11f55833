//! Ordered record of demo output

use std::sync::{Arc, Mutex, MutexGuard};

/// Shared, append-only log of printed lines
///
/// Every line is printed as it is recorded, and kept so callers can inspect
/// the order in which tasks produced output.
#[derive(Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
    quiet: bool,
}

impl Transcript {
    /// Transcript that prints every line to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript that only records
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// Print and record one line
    pub fn record(&self, line: impl Into<String>) {
        let line = line.into();
        if !self.quiet {
            println!("{line}");
        }
        self.lock().push(line);
    }

    /// Lines recorded so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Position of the first line equal to `line`
    #[must_use]
    pub fn position(&self, line: &str) -> Option<usize> {
        self.lock().iter().position(|recorded| recorded == line)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
