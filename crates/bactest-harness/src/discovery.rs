//! Discovery with bounded retry.
//!
//! A sweep broadcasts a presence query, settles, then evaluates the session's
//! discovered-device set against the expected identities, retrying up to a
//! fixed attempt budget. The retry loop is an explicit state machine so the
//! termination condition is testable without any IO: the pure transition
//! lives in [`evaluate`], the async driver in [`run_sweep`].
//!
//! Identity matching is exact. A discovered id satisfies an expectation only
//! if it equals it; id 1001 never stands in for an expected 100.

use crate::capability::BacnetCapability;
use crate::report::CheckReporter;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Retry budget and pacing for one discovery sweep.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Device ids the sweep must observe to succeed.
    pub expected: BTreeSet<u32>,
    /// Broadcast rounds before giving up (not counting the targeted round).
    pub max_attempts: u32,
    /// Wait between issuing a query and inspecting the discovered set.
    pub settle: Duration,
    /// Optional final round: a Who-Is directed at this address after the
    /// broadcast budget is exhausted.
    pub targeted_fallback: Option<Ipv4Addr>,
}

impl DiscoveryConfig {
    pub fn fleet(expected: BTreeSet<u32>) -> Self {
        Self {
            expected,
            max_attempts: 5,
            settle: Duration::from_secs(3),
            targeted_fallback: None,
        }
    }

    pub fn single(device_id: u32, device_ip: Ipv4Addr) -> Self {
        Self {
            expected: BTreeSet::from([device_id]),
            max_attempts: 3,
            settle: Duration::from_secs(3),
            targeted_fallback: Some(device_ip),
        }
    }

    /// Total rounds the sweep may run, including the targeted fallback.
    fn attempt_bound(&self) -> u32 {
        self.max_attempts + u32::from(self.targeted_fallback.is_some())
    }
}

/// Where a sweep currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Querying { attempt: u32 },
    Settling { attempt: u32 },
    Evaluating { attempt: u32 },
    Done,
}

/// Terminal result of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    pub found: BTreeSet<u32>,
    pub missing: BTreeSet<u32>,
    pub attempts: u32,
}

impl DiscoveryOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Pure transition out of the `Evaluating` state.
///
/// The sweep finishes when every expected id has been found or the attempt
/// bound is spent; otherwise it loops back to `Querying`.
pub fn evaluate(
    expected: &BTreeSet<u32>,
    found: &BTreeSet<u32>,
    attempt: u32,
    attempt_bound: u32,
) -> SweepState {
    if found.is_superset(expected) || attempt >= attempt_bound {
        SweepState::Done
    } else {
        SweepState::Querying {
            attempt: attempt + 1,
        }
    }
}

/// Runs one discovery sweep to completion.
///
/// Query errors are swallowed and retried; only the attempt bound ends the
/// sweep early. The discovered set is matched id-for-id against the expected
/// set, so unexpected devices on the network are ignored.
pub async fn run_sweep<C: BacnetCapability>(
    capability: &C,
    config: &DiscoveryConfig,
) -> DiscoveryOutcome {
    let bound = config.attempt_bound();
    let mut found: BTreeSet<u32> = BTreeSet::new();
    let mut attempts = 0;
    let mut state = SweepState::Querying { attempt: 1 };

    loop {
        state = match state {
            SweepState::Querying { attempt } => {
                let targeted = attempt > config.max_attempts;
                let query = if targeted {
                    capability.who_is(config.targeted_fallback).await
                } else {
                    match capability.discover().await {
                        Ok(()) => Ok(()),
                        Err(err) => {
                            log::debug!("discover failed ({err}), falling back to Who-Is");
                            capability.who_is(None).await
                        }
                    }
                };
                if let Err(err) = query {
                    log::debug!("discovery query attempt {attempt} failed: {err}");
                }
                SweepState::Settling { attempt }
            }
            SweepState::Settling { attempt } => {
                tokio::time::sleep(config.settle).await;
                SweepState::Evaluating { attempt }
            }
            SweepState::Evaluating { attempt } => {
                attempts = attempt;
                for id in capability.discovered_devices().await {
                    if config.expected.contains(&id) {
                        found.insert(id);
                    }
                }
                let next = evaluate(&config.expected, &found, attempt, bound);
                if matches!(next, SweepState::Querying { .. }) {
                    println!(
                        "  (retry Who-Is {attempt}/{bound} -- found {}/{})",
                        found.len(),
                        config.expected.len()
                    );
                }
                next
            }
            SweepState::Done => break,
        };
    }

    let missing = config.expected.difference(&found).copied().collect();
    DiscoveryOutcome {
        found,
        missing,
        attempts,
    }
}

/// Converts a sweep outcome into the two standard discovery assertions.
pub fn report_outcome(reporter: &mut CheckReporter, outcome: &DiscoveryOutcome, expected: usize) {
    reporter.check(
        "Who-Is received response(s)",
        !outcome.found.is_empty(),
        "no expected devices discovered after all attempts",
    );
    reporter.check(
        format!("All {expected} devices discovered"),
        outcome.is_complete(),
        format!("missing: {:?}", outcome.missing),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn evaluate_finishes_on_superset() {
        let expected = ids(&[1001, 1002]);
        let found = ids(&[1001, 1002, 2001]);
        assert_eq!(evaluate(&expected, &found, 1, 5), SweepState::Done);
    }

    #[test]
    fn evaluate_retries_until_the_bound() {
        let expected = ids(&[1001]);
        let found = ids(&[]);
        assert_eq!(
            evaluate(&expected, &found, 1, 5),
            SweepState::Querying { attempt: 2 }
        );
        assert_eq!(evaluate(&expected, &found, 5, 5), SweepState::Done);
    }

    #[test]
    fn evaluate_requires_exact_identity_tokens() {
        // A device announcing 1001 must not satisfy an expectation of 100.
        let expected = ids(&[100]);
        let found = ids(&[1001]);
        assert_eq!(evaluate(&expected, &found, 5, 5), SweepState::Done);
        assert!(!found.is_superset(&expected));
    }
}
