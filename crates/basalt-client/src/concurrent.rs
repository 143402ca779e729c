//! Bounded concurrent execution of one statement template
//!
//! The dispatcher fans a parameter sequence out against a single statement
//! template, keeping a fixed number of requests in flight and collecting
//! outcomes indexed by submission order. See
//! [`Client::execute_concurrent`](crate::Client::execute_concurrent).

use crate::error::Error;
use crate::statement::StatementOptions;
use crate::types::ExecutionResult;

/// Options for one concurrent execution run
#[derive(Debug, Clone, Default)]
pub struct ConcurrentOptions {
    /// Maximum simultaneous in-flight requests; `None` uses the client's
    /// configured default
    pub concurrency: Option<usize>,
    /// Abort the remaining set on the first per-tuple failure
    pub stop_on_first_error: bool,
    /// Statement options applied to every tuple (call-site precedence)
    pub options: StatementOptions,
}

/// Outcome for one parameter tuple
#[derive(Debug)]
pub enum Outcome {
    Success(ExecutionResult),
    Failure(Error),
    /// Never dispatched (or abandoned in flight) because an earlier failure
    /// stopped the run
    Skipped,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Outcome::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Failure(err) => Some(err),
            _ => None,
        }
    }
}

/// Accumulated result of a concurrent execution run
///
/// The i-th outcome corresponds to the i-th input tuple regardless of
/// completion order.
#[derive(Debug)]
pub struct ConcurrentJobSet {
    outcomes: Vec<Outcome>,
    succeeded: usize,
    failed: usize,
    skipped: usize,
}

impl ConcurrentJobSet {
    pub(crate) fn from_indexed(mut indexed: Vec<(usize, Outcome)>) -> Self {
        indexed.sort_by_key(|(idx, _)| *idx);
        let mut succeeded = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for (_, outcome) in &indexed {
            match outcome {
                Outcome::Success(_) => succeeded += 1,
                Outcome::Failure(_) => failed += 1,
                Outcome::Skipped => skipped += 1,
            }
        }
        Self {
            outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
            succeeded,
            failed,
            skipped,
        }
    }

    /// Per-tuple outcomes in submission order
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    /// First failure in submission order, if any
    pub fn first_failure(&self) -> Option<(usize, &Error)> {
        self.outcomes
            .iter()
            .enumerate()
            .find_map(|(idx, outcome)| outcome.error().map(|err| (idx, err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> Outcome {
        Outcome::Success(ExecutionResult::new(
            Vec::new(),
            None,
            "n1".to_string(),
            Vec::new(),
        ))
    }

    #[test]
    fn test_outcomes_sorted_by_submission_index() {
        let set = ConcurrentJobSet::from_indexed(vec![
            (2, Outcome::Skipped),
            (0, success()),
            (1, Outcome::Failure(Error::BatchValidation("x".to_string()))),
        ]);

        assert_eq!(set.len(), 3);
        assert!(set.outcomes()[0].is_success());
        assert!(set.outcomes()[1].is_failure());
        assert!(set.outcomes()[2].is_skipped());
        assert_eq!(set.succeeded(), 1);
        assert_eq!(set.failed(), 1);
        assert_eq!(set.skipped(), 1);
        assert!(!set.all_succeeded());
        assert_eq!(set.first_failure().map(|(idx, _)| idx), Some(1));
    }

    #[test]
    fn test_all_succeeded() {
        let set = ConcurrentJobSet::from_indexed(vec![(0, success()), (1, success())]);
        assert!(set.all_succeeded());
        assert!(set.first_failure().is_none());
    }
}
