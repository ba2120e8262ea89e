//! Executes brews with per-brew failure isolation.
//!
//! Every brew body runs in its own tokio task, so an error or a panic in one
//! brew is turned into that brew's [`RunOutcome`] and never reaches its
//! siblings. All brews share one [`CancellationToken`].

use crate::error::{panic_message, BrewError, BrewResult};
use crate::module::{self, Descriptor};
use crate::registry::{BrewEntry, Registry};
use crate::selector;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Outcomes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    identity: String,
    status: RunStatus,
    elapsed: Duration,
}

impl RunOutcome {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn into_result(self) -> BrewResult<()> {
        match self.status {
            RunStatus::Completed => Ok(()),
            RunStatus::Failed(message) => Err(BrewError::module_failure(self.identity, message)),
            RunStatus::Cancelled => Err(BrewError::Cancelled),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    outcomes: Vec<RunOutcome>,
}

impl RunReport {
    /// Outcomes in the order the brews were handed to the runner.
    pub fn outcomes(&self) -> &[RunOutcome] {
        &self.outcomes
    }

    pub fn completed(&self) -> usize {
        self.count(|status| matches!(status, RunStatus::Completed))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, RunStatus::Failed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|status| matches!(status, RunStatus::Cancelled))
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunOutcome> {
        self.outcomes.iter().filter(|o| matches!(o.status, RunStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&RunStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

// =============================================================================
// Progress reporting
// =============================================================================

/// Receives a start marker and a finish marker per brew. Called concurrently
/// from every running brew.
pub trait Progress: Send + Sync {
    fn started(&self, descriptor: &Descriptor);
    fn finished(&self, outcome: &RunOutcome);
}

pub struct SilentProgress;

impl Progress for SilentProgress {
    fn started(&self, _descriptor: &Descriptor) {}
    fn finished(&self, _outcome: &RunOutcome) {}
}

// =============================================================================
// Runner
// =============================================================================

#[derive(Clone)]
pub struct Runner {
    token: CancellationToken,
    progress: Arc<dyn Progress>,
    max_concurrency: Option<usize>,
}

impl Runner {
    pub fn new(token: CancellationToken, progress: Arc<dyn Progress>) -> Self {
        Self {
            token,
            progress,
            max_concurrency: None,
        }
    }

    /// Caps how many brews execute at once in [`run_all`](Self::run_all).
    /// A limit of zero is treated as one.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.map(|n| n.max(1));
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Same token and limits, without progress markers.
    pub fn quiet(&self) -> Self {
        Self {
            progress: Arc::new(SilentProgress),
            ..self.clone()
        }
    }

    pub async fn run_one(&self, entry: &BrewEntry) -> RunOutcome {
        self.execute(entry.clone(), None).await
    }

    pub async fn run_named(&self, registry: &Registry, pattern: &str) -> BrewResult<RunOutcome> {
        let entry = selector::select(registry, pattern)?;
        Ok(self.run_one(entry).await)
    }

    /// Starts every brew at once and waits for all of them to settle.
    pub async fn run_all(&self, entries: &[BrewEntry]) -> RunReport {
        let limiter = self.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));

        let runs = entries
            .iter()
            .cloned()
            .map(|entry| self.execute(entry, limiter.clone()));

        RunReport {
            outcomes: join_all(runs).await,
        }
    }

    async fn execute(&self, entry: BrewEntry, limiter: Option<Arc<Semaphore>>) -> RunOutcome {
        let _permit = match limiter {
            Some(semaphore) => semaphore.acquire_owned().await.ok(),
            None => None,
        };

        let identity = entry.identity().to_string();
        self.progress.started(entry.descriptor());
        tracing::debug!(brew = %identity, "starting");

        let started = Instant::now();
        let brew = Arc::clone(entry.brew());
        let token = self.token.clone();
        let task_identity = identity.clone();
        let joined =
            tokio::spawn(async move { module::invoke(brew.as_ref(), &task_identity, token).await })
                .await;

        let status = match joined {
            Ok(Ok(())) => RunStatus::Completed,
            Ok(Err(err)) if BrewError::is_cancellation(&err) => RunStatus::Cancelled,
            Ok(Err(err)) => RunStatus::Failed(format!("{err:#}")),
            Err(join_err) if join_err.is_panic() => {
                let payload = join_err.into_panic();
                RunStatus::Failed(format!("panicked: {}", panic_message(payload.as_ref())))
            }
            Err(_) => RunStatus::Cancelled,
        };

        let outcome = RunOutcome {
            identity,
            status,
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            brew = %outcome.identity,
            status = ?outcome.status,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "finished"
        );
        self.progress.finished(&outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{failing, noop, panicking, polling, recording, stubborn, RunLog};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Markers {
        started: Mutex<Vec<String>>,
        finished: Mutex<Vec<RunOutcome>>,
        peak: AtomicUsize,
        active: AtomicUsize,
    }

    impl Progress for Markers {
        fn started(&self, descriptor: &Descriptor) {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.started.lock().unwrap().push(descriptor.identity().to_string());
        }

        fn finished(&self, outcome: &RunOutcome) {
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.lock().unwrap().push(outcome.clone());
        }
    }

    fn runner() -> (Runner, Arc<Markers>) {
        let markers = Arc::new(Markers::default());
        let runner = Runner::new(CancellationToken::new(), markers.clone());
        (runner, markers)
    }

    #[tokio::test]
    async fn test_run_one_success() {
        let (runner, markers) = runner();
        let registry = Registry::discover(vec![noop("Factory")]);

        let outcome = runner.run_one(&registry.entries()[0]).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.identity(), "Factory");
        assert_eq!(*markers.started.lock().unwrap(), vec!["Factory"]);
        assert_eq!(markers.finished.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_silent_progress_still_reports_outcomes() {
        let runner = Runner::new(CancellationToken::new(), Arc::new(SilentProgress));
        let registry = Registry::discover(vec![noop("A"), failing("B")]);

        let report = runner.run_all(registry.entries()).await;
        assert_eq!((report.completed(), report.failed()), (1, 1));
    }

    #[tokio::test]
    async fn test_run_one_reports_failure_with_identity() {
        let (runner, _) = runner();
        let registry = Registry::discover(vec![failing("Broken")]);

        let outcome = runner.run_one(&registry.entries()[0]).await;
        match outcome.status() {
            RunStatus::Failed(message) => assert!(message.contains("Broken exploded on purpose")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(
            outcome.into_result(),
            Err(BrewError::ModuleFailure { identity, .. }) if identity == "Broken"
        ));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (runner, _) = runner();
        let registry = Registry::discover(vec![panicking("Panicky"), noop("Steady")]);

        let report = runner.run_all(registry.entries()).await;
        assert_eq!(report.completed(), 1);
        assert_eq!(report.failed(), 1);
        let failure = report.failures().next().unwrap();
        assert_eq!(failure.identity(), "Panicky");
        assert!(matches!(failure.status(), RunStatus::Failed(m) if m.contains("brew panicked mid-demo")));
    }

    #[tokio::test]
    async fn test_run_named_executes_only_the_match() {
        let (runner, _) = runner();
        let log = RunLog::default();
        let registry = Registry::discover(vec![
            recording("Factory", &log),
            recording("Strategy", &log),
        ]);

        let outcome = runner.run_named(&registry, "Factory").await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["Factory"]);
    }

    #[tokio::test]
    async fn test_run_named_propagates_selector_errors() {
        let (runner, markers) = runner();
        let registry = Registry::discover(vec![noop("Strategy"), noop("Stranger")]);

        assert!(matches!(
            runner.run_named(&registry, "Str").await,
            Err(BrewError::Ambiguous { .. })
        ));
        assert!(matches!(
            runner.run_named(&registry, "Nothing").await,
            Err(BrewError::NotFound { .. })
        ));
        assert!(markers.started.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_failure_is_isolated_for_any_batch_size() {
        for n in 1..=8usize {
            for k in 0..n {
                let (runner, markers) = runner();
                let registrations = (0..n).map(|i| {
                    let identity = format!("brew{i:02}");
                    if i == k {
                        failing(&identity)
                    } else {
                        noop(&identity)
                    }
                });
                let registry = Registry::discover(registrations);

                let report = runner.run_all(registry.entries()).await;
                assert_eq!(report.outcomes().len(), n);
                assert_eq!(report.failed(), 1);
                assert_eq!(report.completed(), n - 1);
                assert_eq!(report.failures().next().unwrap().identity(), format!("brew{k:02}"));
                assert_eq!(markers.started.lock().unwrap().len(), n);
                assert_eq!(markers.finished.lock().unwrap().len(), n);
            }
        }
    }

    #[tokio::test]
    async fn test_report_keeps_entry_order() {
        let (runner, _) = runner();
        let registry = Registry::discover(vec![noop("c"), stubborn("a"), noop("b")]);
        let report = runner.run_all(registry.entries()).await;
        let order: Vec<&str> = report.outcomes().iter().map(RunOutcome::identity).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancellation_stops_polling_brews() {
        let (runner, _) = runner();
        let registry = Registry::discover(vec![polling("poller-1"), polling("poller-2"), stubborn("stubborn")]);

        let token = runner.token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            token.cancel();
        });

        let report = tokio::time::timeout(Duration::from_secs(5), runner.run_all(registry.entries()))
            .await
            .expect("cancelled brews must unwind promptly");

        assert_eq!(report.cancelled(), 2);
        // The stubborn brew ignores the token and simply finishes.
        assert_eq!(report.completed(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn test_already_cancelled_token_skips_execution() {
        let (runner, _) = runner();
        let log = RunLog::default();
        let registry = Registry::discover(vec![recording("Factory", &log)]);
        runner.token().cancel();

        let outcome = runner.run_one(&registry.entries()[0]).await;
        assert_eq!(outcome.status(), &RunStatus::Cancelled);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_limit_is_respected() {
        let markers = Arc::new(Markers::default());
        let runner = Runner::new(CancellationToken::new(), markers.clone()).with_max_concurrency(Some(2));
        let registry = Registry::discover((0..6).map(|i| stubborn(&format!("slow{i}"))));

        let report = runner.run_all(registry.entries()).await;
        assert_eq!(report.completed(), 6);
        assert!(markers.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_unbounded_run_starts_everything() {
        let (runner, markers) = runner();
        let registry = Registry::discover((0..5).map(|i| stubborn(&format!("slow{i}"))));

        runner.run_all(registry.entries()).await;
        assert_eq!(markers.peak.load(Ordering::SeqCst), 5);
    }
}
