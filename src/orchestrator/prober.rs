//! Probing gateway addresses until one answers a query

use tokio::time::sleep;
use tracing::{debug, warn};

use super::selector::NodePicker;
use super::OrchestrationError;
use crate::config::ProbePolicy;
use crate::probe::{ProbeError, SqlProbe};

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Reachable {
        host: String,
        attempts: u32,
    },
    TimedOut {
        attempts: u32,
        last_error: Option<ProbeError>,
    },
}

/// Probe randomly chosen candidates until one succeeds.
///
/// Candidates are chosen with replacement, so a failing address can be picked
/// again. An empty candidate set is an error: there is nothing to probe.
pub async fn probe_until_ready(
    probe: &dyn SqlProbe,
    candidates: &[String],
    port: u16,
    policy: &ProbePolicy,
    picker: &mut dyn NodePicker,
) -> Result<ProbeOutcome, OrchestrationError> {
    if candidates.is_empty() {
        return Err(OrchestrationError::NoCandidates);
    }

    let mut last_error = None;
    for attempt in 1..=policy.max_attempts {
        let host = &candidates[picker.pick(candidates.len()) % candidates.len()];
        debug!("probing {}:{} (attempt {}/{})", host, port, attempt, policy.max_attempts);

        match probe.probe(host, port).await {
            Ok(()) => {
                return Ok(ProbeOutcome::Reachable {
                    host: host.clone(),
                    attempts: attempt,
                })
            }
            Err(e) => {
                warn!("connection tidb {}:{} error {}, continue", host, port, e);
                last_error = Some(e);
            }
        }

        if attempt < policy.max_attempts {
            sleep(policy.interval()).await;
        }
    }

    Ok(ProbeOutcome::TimedOut {
        attempts: policy.max_attempts,
        last_error,
    })
}


#[cfg(test)]
mod tests {
    use super::mock::MockProbe;
    use super::*;
    use crate::orchestrator::selector::{RandomPicker, SequencePicker};

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn policy(max_attempts: u32) -> ProbePolicy {
        ProbePolicy {
            max_attempts,
            interval_secs: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_returns_first_healthy_host() {
        let probe = MockProbe::healthy(&["B"]);
        let mut picker = SequencePicker::new(vec![0, 0, 1]);

        let outcome = probe_until_ready(&probe, &hosts(&["A", "B"]), 4000, &policy(10), &mut picker)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ProbeOutcome::Reachable {
                host: "B".to_string(),
                attempts: 3,
            }
        );
        assert_eq!(probe.probed(), hosts(&["A", "A", "B"]));
    }

    #[tokio::test]
    async fn test_single_attempt_may_time_out() {
        let probe = MockProbe::healthy(&["B"]);
        let mut picker = SequencePicker::new(vec![0]);

        let outcome = probe_until_ready(&probe, &hosts(&["A", "B"]), 4000, &policy(1), &mut picker)
            .await
            .unwrap();
        match outcome {
            ProbeOutcome::TimedOut {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 1);
                assert!(matches!(last_error, Some(ProbeError::Connect(_))));
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_random_selection_converges() {
        let probe = MockProbe::healthy(&["B"]);
        let mut picker = RandomPicker::seeded(7);

        let outcome = probe_until_ready(&probe, &hosts(&["A", "B"]), 4000, &policy(200), &mut picker)
            .await
            .unwrap();
        assert!(matches!(outcome, ProbeOutcome::Reachable { ref host, .. } if host == "B"));
    }

    #[tokio::test]
    async fn test_exhausts_exactly_max_attempts() {
        let probe = MockProbe::healthy(&[]);
        let mut picker = RandomPicker::seeded(1);

        let outcome = probe_until_ready(&probe, &hosts(&["A", "B"]), 4000, &policy(6), &mut picker)
            .await
            .unwrap();
        assert!(matches!(outcome, ProbeOutcome::TimedOut { attempts: 6, .. }));
        assert_eq!(probe.probed().len(), 6);
    }

    #[tokio::test]
    async fn test_empty_candidates_is_fatal() {
        let probe = MockProbe::healthy(&["A"]);
        let mut picker = RandomPicker::seeded(1);

        let result = probe_until_ready(&probe, &[], 4000, &policy(5), &mut picker).await;
        assert!(matches!(result, Err(OrchestrationError::NoCandidates)));
        assert!(probe.probed().is_empty());
    }
}
