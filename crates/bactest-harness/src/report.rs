//! Pass/fail bookkeeping for a conformance run.
//!
//! A [`CheckReporter`] is the single point of record for every assertion. It
//! is created once per run and threaded `&mut` through the phases; there is
//! no global state. Every `check` call records exactly one result, so the
//! final tally always equals the number of checks executed.

use serde::Serialize;

/// Outcome of one assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub label: String,
    pub passed: bool,
    pub detail: String,
}

/// A check that was deliberately not run (missing optional capability).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCheck {
    pub label: String,
    pub reason: String,
}

/// Counts folded over the recorded results at end of run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Full machine-readable record of a run, for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub checks: Vec<CheckResult>,
    pub skipped: Vec<SkippedCheck>,
    pub summary: RunSummary,
}

/// Records assertions and prints a running PASS/FAIL log.
#[derive(Debug, Default)]
pub struct CheckReporter {
    results: Vec<CheckResult>,
    skips: Vec<SkippedCheck>,
}

impl CheckReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints a phase header.
    pub fn section(&self, title: &str) {
        println!("\n--- Test: {title} ---");
    }

    /// Records one assertion and echoes it. Returns `condition` so callers
    /// can chain follow-up decisions on the outcome.
    pub fn check(
        &mut self,
        label: impl Into<String>,
        condition: bool,
        detail: impl Into<String>,
    ) -> bool {
        let label = label.into();
        let detail = detail.into();
        if condition {
            println!("  PASS: {label}");
        } else {
            println!("  FAIL: {label} -- {detail}");
        }
        self.results.push(CheckResult {
            label,
            passed: condition,
            detail,
        });
        condition
    }

    /// Records a skipped check. Skips contribute to neither counter.
    pub fn skip(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        let label = label.into();
        let reason = reason.into();
        println!("  SKIP: {label} -- {reason}");
        self.skips.push(SkippedCheck { label, reason });
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn skips(&self) -> &[SkippedCheck] {
        &self.skips
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            passed: self.passed(),
            failed: self.failed(),
            skipped: self.skips.len(),
        }
    }

    pub fn into_report(self) -> RunReport {
        let summary = self.summary();
        RunReport {
            checks: self.results,
            skipped: self.skips,
            summary,
        }
    }
}
