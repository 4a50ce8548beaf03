//! Round scheduler
//!
//! Dispatches one worker attempt per target each round, sequentially or
//! fanned out under a bounded semaphore, and decides what the round means:
//! any success halts the whole run, everything else backs off and goes
//! again. The loop has no built-in round cap — seats open at unpredictable
//! times and the process is expected to wait them out; an operator cap is
//! opt-in.
//!
//! Cancellation is observed at suspension points only (round start,
//! between sequential attempts, while draining concurrent outcomes, and
//! during the inter-round sleep). In-flight attempts always finish
//! cleanly; on a concurrent-round success the sibling attempts keep
//! running detached and never delay the halt.

use std::sync::Arc;
use std::time::Duration;

use elective_client::{SubmitReceipt, Target};
use tokio::sync::{Semaphore, mpsc, watch};
use tracing::{debug, info};

use crate::backoff;
use crate::events::{Event, EventSink};
use crate::outcome::{AttemptOutcome, RoundResult, TerminalOutcome};
use crate::worker::Worker;

/// Tuning knobs for the round loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Upper bound on concurrently running attempts. 1 means strictly
    /// sequential rounds (required by some rate-limited deployments).
    pub max_workers: usize,
    /// Base inter-round delay.
    pub base_delay: Duration,
    /// Uniform jitter applied to the base delay.
    pub jitter: Duration,
    /// Optional operator-supplied round cap. None means run until success
    /// or cancellation.
    pub max_rounds: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            base_delay: Duration::from_millis(750),
            jitter: Duration::from_millis(250),
            max_rounds: None,
        }
    }
}

/// What a single round reduced to.
enum RoundControl {
    Success { target: Target, receipt: SubmitReceipt },
    Cancelled,
    Completed(RoundResult),
}

/// Owns the round loop for a fixed set of targets.
pub struct Driver {
    worker: Arc<Worker>,
    targets: Vec<Target>,
    config: DriverConfig,
    events: Arc<dyn EventSink>,
}

impl Driver {
    pub fn new(
        worker: Arc<Worker>,
        targets: Vec<Target>,
        config: DriverConfig,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            worker,
            targets,
            config,
            events,
        }
    }

    /// Run rounds until a seat is acquired, the round cap is hit, or
    /// `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> TerminalOutcome {
        let mut round: u64 = 0;
        loop {
            if *shutdown.borrow() {
                return self.finish(TerminalOutcome::Cancelled { round });
            }

            round += 1;
            self.events.emit(Event::RoundStarted { round });
            debug!(round, targets = self.targets.len(), "dispatching round");

            let control = if self.config.max_workers <= 1 {
                self.sequential_round(&shutdown).await
            } else {
                self.concurrent_round(&mut shutdown).await
            };

            let result = match control {
                RoundControl::Success { target, receipt } => {
                    return self.finish(TerminalOutcome::Enrolled {
                        target,
                        round,
                        receipt,
                    });
                }
                RoundControl::Cancelled => {
                    return self.finish(TerminalOutcome::Cancelled { round });
                }
                RoundControl::Completed(result) => result,
            };

            debug!(
                round,
                outcomes = result.len(),
                auth_expired = result.any_auth_expired(),
                "round completed without success"
            );

            if let Some(limit) = self.config.max_rounds {
                if round >= limit {
                    return self.finish(TerminalOutcome::RoundLimitReached { rounds: round });
                }
            }

            let delay = backoff::jittered_delay(self.config.base_delay, self.config.jitter);
            self.events.emit(Event::Backoff { delay });
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return self.finish(TerminalOutcome::Cancelled { round });
                    }
                }
            }
        }
    }

    /// One attempt per target, in configuration order, stopping at the
    /// first success.
    async fn sequential_round(&self, shutdown: &watch::Receiver<bool>) -> RoundControl {
        let mut result = RoundResult::default();
        for target in &self.targets {
            if *shutdown.borrow() {
                return RoundControl::Cancelled;
            }
            match self.worker.attempt(target).await {
                AttemptOutcome::Success { receipt } => {
                    return RoundControl::Success {
                        target: target.clone(),
                        receipt,
                    };
                }
                outcome => result.push(target.clone(), outcome),
            }
        }
        RoundControl::Completed(result)
    }

    /// One attempt per target, admission-bounded by `max_workers`,
    /// outcomes drained in completion order. The first observed success
    /// halts the round; remaining attempts finish detached.
    async fn concurrent_round(&self, shutdown: &mut watch::Receiver<bool>) -> RoundControl {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<(Target, AttemptOutcome)>();

        for target in self.targets.iter().cloned() {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let outcome = worker.attempt(&target).await;
                let _ = tx.send((target, outcome));
            });
        }
        drop(tx);

        let mut result = RoundResult::default();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some((target, AttemptOutcome::Success { receipt })) => {
                        return RoundControl::Success { target, receipt };
                    }
                    Some((target, outcome)) => result.push(target, outcome),
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return RoundControl::Cancelled;
                    }
                }
            }
        }
        RoundControl::Completed(result)
    }

    fn finish(&self, outcome: TerminalOutcome) -> TerminalOutcome {
        info!(outcome = %outcome.summary(), "acquisition loop finished");
        self.events.emit(Event::Finished {
            summary: outcome.summary(),
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialCell;
    use crate::refresh::RefreshCoordinator;
    use crate::testutil::{
        CollectingSink, CountingProvider, ScriptedApi, receipt, report, target,
    };
    use elective_client::{Credential, ProbeError};

    fn driver_with(
        api: Arc<ScriptedApi>,
        targets: Vec<Target>,
        config: DriverConfig,
        provider: CountingProvider,
    ) -> (Driver, Arc<CountingProvider>, Arc<CollectingSink>) {
        let cell = Arc::new(CredentialCell::new(Some(Credential::new("tok".into()))));
        let provider = Arc::new(provider);
        let sink = Arc::new(CollectingSink::default());
        let refresher = Arc::new(RefreshCoordinator::new(
            cell.clone(),
            provider.clone(),
            sink.clone(),
        ));
        let worker = Arc::new(Worker::new(api, cell, refresher, sink.clone()));
        let driver = Driver::new(worker, targets, config, sink.clone());
        (driver, provider, sink)
    }

    fn quick_config(max_workers: usize, max_rounds: Option<u64>) -> DriverConfig {
        DriverConfig {
            max_workers,
            base_delay: Duration::from_millis(750),
            jitter: Duration::ZERO,
            max_rounds,
        }
    }

    #[tokio::test]
    async fn halts_on_first_round_success() {
        // Scenario B: open seat, accepted submission, halt after round 1
        let api = Arc::new(ScriptedApi::new());
        let t = target("08305016");
        api.script_probe(&t, Ok(vec![report(30, 29, "ci-1")]));
        api.script_submit(&t, Ok(receipt()));

        let (driver, _, sink) = driver_with(
            api.clone(),
            vec![t.clone()],
            quick_config(1, None),
            CountingProvider::succeeding(),
        );
        let (_tx, rx) = watch::channel(false);

        match driver.run(rx).await {
            TerminalOutcome::Enrolled { target, round, .. } => {
                assert_eq!(target, t);
                assert_eq!(round, 1);
            }
            other => panic!("expected Enrolled, got: {other:?}"),
        }
        assert_eq!(api.probe_calls(), 1);
        assert_eq!(
            sink.count(|e| matches!(e, Event::Backoff { .. })),
            0,
            "success in round 1 must not back off"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn auth_expiry_refreshes_once_before_next_round() {
        // Scenario C: probe 401 in round 1, fresh credential wins round 2
        let api = Arc::new(ScriptedApi::new());
        let t = target("08305016");
        api.script_probe(&t, Err(ProbeError::AuthExpired { status: 401 }));
        api.script_probe(&t, Ok(vec![report(30, 29, "ci-1")]));
        api.script_submit(&t, Ok(receipt()));

        let (driver, provider, sink) = driver_with(
            api.clone(),
            vec![t.clone()],
            quick_config(1, None),
            CountingProvider::succeeding(),
        );
        let (_tx, rx) = watch::channel(false);

        match driver.run(rx).await {
            TerminalOutcome::Enrolled { round, .. } => assert_eq!(round, 2),
            other => panic!("expected Enrolled, got: {other:?}"),
        }
        assert_eq!(provider.calls(), 1, "exactly one refresh between rounds");
        assert_eq!(sink.count(|e| matches!(e, Event::RefreshSucceeded)), 1);
    }

    #[tokio::test]
    async fn concurrent_round_halts_on_any_success() {
        // Scenario D: one target full, the other succeeds; the full
        // target's outcome must not block the halt
        let api = Arc::new(ScriptedApi::new());
        let full = target("08305016");
        let open = target("08306021");
        api.script_probe(&full, Ok(vec![report(30, 30, "ci-full")]));
        api.script_probe(&open, Ok(vec![report(30, 12, "ci-open")]));
        api.script_submit(&open, Ok(receipt()));

        let (driver, _, _) = driver_with(
            api.clone(),
            vec![full.clone(), open.clone()],
            quick_config(2, None),
            CountingProvider::succeeding(),
        );
        let (_tx, rx) = watch::channel(false);

        match driver.run(rx).await {
            TerminalOutcome::Enrolled { target, round, .. } => {
                assert_eq!(target, open);
                assert_eq!(round, 1);
            }
            other => panic!("expected Enrolled, got: {other:?}"),
        }
        assert_eq!(api.submit_calls(), 1, "the full target never submits");
    }

    #[tokio::test]
    async fn sequential_round_stops_at_first_success() {
        let api = Arc::new(ScriptedApi::new());
        let first = target("08305016");
        let second = target("08306021");
        api.script_probe(&first, Ok(vec![report(30, 29, "ci-1")]));
        api.script_submit(&first, Ok(receipt()));

        let (driver, _, _) = driver_with(
            api.clone(),
            vec![first.clone(), second],
            quick_config(1, None),
            CountingProvider::succeeding(),
        );
        let (_tx, rx) = watch::channel(false);

        assert!(matches!(
            driver.run(rx).await,
            TerminalOutcome::Enrolled { round: 1, .. }
        ));
        assert_eq!(
            api.probe_calls(),
            1,
            "later targets are skipped once a seat is claimed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_progress_rounds_are_idempotent_until_limit() {
        // Identical remote state each round: same SeatFull shape, zero
        // submissions, one probe per round
        let api = Arc::new(ScriptedApi::new());
        let t = target("08305016");
        for _ in 0..3 {
            api.script_probe(&t, Ok(vec![report(30, 30, "ci-1")]));
        }

        let (driver, _, sink) = driver_with(
            api.clone(),
            vec![t.clone()],
            quick_config(1, Some(3)),
            CountingProvider::succeeding(),
        );
        let (_tx, rx) = watch::channel(false);

        match driver.run(rx).await {
            TerminalOutcome::RoundLimitReached { rounds } => assert_eq!(rounds, 3),
            other => panic!("expected RoundLimitReached, got: {other:?}"),
        }
        assert_eq!(api.probe_calls(), 3);
        assert_eq!(api.submit_calls(), 0);
        assert_eq!(sink.count(|e| matches!(e, Event::SeatFull { .. })), 3);
        assert_eq!(sink.count(|e| matches!(e, Event::RoundStarted { .. })), 3);
    }

    #[tokio::test]
    async fn round_limit_of_one_stops_after_single_pass() {
        let api = Arc::new(ScriptedApi::new());
        let t = target("08305016");
        api.script_probe(&t, Ok(vec![report(30, 30, "ci-1")]));

        let (driver, _, sink) = driver_with(
            api.clone(),
            vec![t],
            quick_config(1, Some(1)),
            CountingProvider::succeeding(),
        );
        let (_tx, rx) = watch::channel(false);

        assert!(matches!(
            driver.run(rx).await,
            TerminalOutcome::RoundLimitReached { rounds: 1 }
        ));
        assert_eq!(
            sink.count(|e| matches!(e, Event::Backoff { .. })),
            0,
            "no backoff after the final round"
        );
    }

    #[tokio::test]
    async fn cancelled_before_start_runs_no_rounds() {
        let api = Arc::new(ScriptedApi::new());
        let t = target("08305016");

        let (driver, _, _) = driver_with(
            api.clone(),
            vec![t],
            quick_config(1, None),
            CountingProvider::succeeding(),
        );
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert!(matches!(
            driver.run(rx).await,
            TerminalOutcome::Cancelled { round: 0 }
        ));
        assert_eq!(api.probe_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_takes_effect_at_next_suspension_point() {
        // Unscripted probes resolve to empty listings, so the driver would
        // loop forever without the shutdown signal
        let api = Arc::new(ScriptedApi::new());
        let t = target("08305016");

        let (driver, _, sink) = driver_with(
            api.clone(),
            vec![t],
            quick_config(1, None),
            CountingProvider::succeeding(),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { driver.run(rx).await });
        tokio::task::yield_now().await;
        tx.send(true).unwrap();

        let outcome = handle.await.unwrap();
        assert!(
            matches!(outcome, TerminalOutcome::Cancelled { .. }),
            "got: {outcome:?}"
        );
        assert_eq!(sink.count(|e| matches!(e, Event::Finished { .. })), 1);
    }
}
