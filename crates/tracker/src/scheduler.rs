//! Single-job poll scheduler.
//!
//! Owns one repeating poll task at a time. Each tick issues exactly one
//! `fetch_status` call and awaits it before the next tick can fire;
//! intervals that elapse while a call is outstanding are skipped, not
//! queued. Results are delivered to the controller tagged with the
//! [`JobId`] they were fetched for, which is what enables the
//! stale-result check downstream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use dreamtrack_core::state::JobId;

use crate::api::{ApiError, StatusOutcome};
use crate::service::JobService;

/// One poll result, tagged with the job it was fetched for.
#[derive(Debug)]
pub struct PollUpdate {
    pub job_id: JobId,
    pub outcome: Result<StatusOutcome, ApiError>,
}

/// Schedules status polls for at most one job at a time.
pub struct PollScheduler {
    service: Arc<dyn JobService>,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<PollUpdate>,
    active: Option<ActivePoll>,
}

/// Bookkeeping for the currently running poll task.
struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
}

impl PollScheduler {
    pub fn new(
        service: Arc<dyn JobService>,
        poll_interval: Duration,
        update_tx: mpsc::UnboundedSender<PollUpdate>,
    ) -> Self {
        Self {
            service,
            poll_interval,
            update_tx,
            active: None,
        }
    }

    /// Begin polling `job_id`. Any previous poll task is cancelled
    /// first: only one job is ever polled at a time.
    pub fn start(&mut self, job_id: JobId) {
        self.stop();

        let cancel = CancellationToken::new();
        tokio::spawn(run_poll_loop(
            Arc::clone(&self.service),
            job_id.clone(),
            self.poll_interval,
            self.update_tx.clone(),
            cancel.clone(),
        ));

        tracing::debug!(job_id = %job_id, "Poll task started");
        self.active = Some(ActivePoll { job_id, cancel });
    }

    /// Cancel the active poll task. Idempotent: stopping an already
    /// stopped scheduler is a no-op.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            tracing::debug!(job_id = %active.job_id, "Poll task stopped");
        }
    }

    /// The job currently being polled, if any.
    pub fn current_job(&self) -> Option<&JobId> {
        self.active.as_ref().map(|a| &a.job_id)
    }
}

/// The repeating poll task for one job.
///
/// The fetch is awaited inside the loop body, so at most one
/// `fetch_status` call is ever outstanding; `MissedTickBehavior::Skip`
/// drops the ticks that elapsed meanwhile. The first fetch happens one
/// full interval after start.
async fn run_poll_loop(
    service: Arc<dyn JobService>,
    job_id: JobId,
    period: Duration,
    update_tx: mpsc::UnboundedSender<PollUpdate>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %job_id, "Poll loop cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let outcome = service.fetch_status(&job_id).await;

        // A result fetched after stop() is dropped here; the
        // controller's job-id check catches anything still in flight.
        if cancel.is_cancelled() {
            return;
        }

        let update = PollUpdate {
            job_id: job_id.clone(),
            outcome,
        };
        if update_tx.send(update).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use dreamtrack_core::request::GenerationRequest;
    use dreamtrack_core::state::JobPhase;

    use super::*;
    use crate::api::SubmitOutcome;

    /// Always reports the job as still queued; records every fetch and
    /// tracks how many are in flight at once.
    struct CountingService {
        fetched: Mutex<Vec<JobId>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fetch_delay: Duration,
    }

    impl CountingService {
        fn new(fetch_delay: Duration) -> Self {
            Self {
                fetched: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                fetch_delay,
            }
        }

        fn fetched(&self) -> Vec<JobId> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobService for CountingService {
        async fn submit(&self, _: &GenerationRequest) -> Result<SubmitOutcome, ApiError> {
            unimplemented!("the scheduler never submits")
        }

        async fn fetch_status(&self, job_id: &JobId) -> Result<StatusOutcome, ApiError> {
            self.fetched.lock().unwrap().push(job_id.clone());
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(StatusOutcome::StillRunning {
                phase: JobPhase::Queued,
            })
        }
    }

    const PERIOD: Duration = Duration::from_millis(5000);

    fn scheduler(
        service: Arc<CountingService>,
    ) -> (PollScheduler, mpsc::UnboundedReceiver<PollUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PollScheduler::new(service, PERIOD, tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn first_poll_happens_one_interval_after_start() {
        let service = Arc::new(CountingService::new(Duration::ZERO));
        let (mut scheduler, mut rx) = scheduler(Arc::clone(&service));

        scheduler.start(JobId::new("a"));
        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert!(service.fetched().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(service.fetched(), vec![JobId::new("a")]);

        let update = rx.try_recv().unwrap();
        assert_eq!(update.job_id, JobId::new("a"));
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let service = Arc::new(CountingService::new(Duration::ZERO));
        let (mut scheduler, _rx) = scheduler(Arc::clone(&service));

        scheduler.stop();

        scheduler.start(JobId::new("a"));
        scheduler.stop();
        scheduler.stop();
        assert!(scheduler.current_job().is_none());

        tokio::time::sleep(PERIOD * 3).await;
        assert!(service.fetched().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_polls_after_stop() {
        let service = Arc::new(CountingService::new(Duration::ZERO));
        let (mut scheduler, _rx) = scheduler(Arc::clone(&service));

        scheduler.start(JobId::new("a"));
        tokio::time::sleep(PERIOD * 2 + Duration::from_millis(100)).await;
        let polled = service.fetched().len();
        assert!(polled >= 2);

        scheduler.stop();
        tokio::time::sleep(PERIOD * 4).await;
        assert_eq!(service.fetched().len(), polled);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_a_new_job_replaces_the_old_one() {
        let service = Arc::new(CountingService::new(Duration::ZERO));
        let (mut scheduler, _rx) = scheduler(Arc::clone(&service));

        scheduler.start(JobId::new("a"));
        tokio::time::sleep(PERIOD + Duration::from_millis(100)).await;

        scheduler.start(JobId::new("b"));
        assert_eq!(scheduler.current_job(), Some(&JobId::new("b")));
        tokio::time::sleep(PERIOD * 3).await;

        let fetched = service.fetched();
        assert_eq!(fetched[0], JobId::new("a"));
        assert!(fetched[1..].iter().all(|id| id == &JobId::new("b")));
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_never_overlap_and_skip_missed_ticks() {
        // Each fetch takes 12s against a 5s interval: ticks at 10s and
        // 15s are skipped while the first fetch is outstanding.
        let service = Arc::new(CountingService::new(Duration::from_millis(12_000)));
        let (mut scheduler, _rx) = scheduler(Arc::clone(&service));

        scheduler.start(JobId::new("a"));
        tokio::time::sleep(Duration::from_millis(61_000)).await;
        scheduler.stop();

        assert_eq!(service.max_in_flight.load(Ordering::SeqCst), 1);
        // Without skipping this would be ~12 fetches in 61s.
        assert!(service.fetched().len() <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn result_in_flight_during_stop_is_dropped() {
        let service = Arc::new(CountingService::new(Duration::from_millis(2000)));
        let (mut scheduler, mut rx) = scheduler(Arc::clone(&service));

        scheduler.start(JobId::new("a"));
        // Land inside the first fetch (starts at 5s, resolves at 7s).
        tokio::time::sleep(Duration::from_millis(6000)).await;
        scheduler.stop();

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(rx.try_recv().is_err());
    }
}
