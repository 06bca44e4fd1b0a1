use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::types::ConsoleError;

use super::view::{ErrorPolicy, LoadPhase, RefreshableView, Ticket};

/// One data source a view polls.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    async fn fetch(&self) -> Result<Self::Output, ConsoleError>;
}

/// Anything a finished mutation can ask to reload itself.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    async fn request_refresh(&self);
}

/// Adapts an async closure into a [`Fetch`].
pub struct FetchFn<F>(pub F);

#[async_trait]
impl<F, Fut, T> Fetch for FetchFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ConsoleError>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    async fn fetch(&self) -> Result<T, ConsoleError> {
        (self.0)().await
    }
}

type SharedView<T> = Arc<watch::Sender<RefreshableView<T>>>;

/// Owns the timer of one polling view. The timer exists only between
/// [`attach`](Self::attach) and [`detach`](Self::detach) (or drop); results
/// that arrive after detaching are discarded.
pub struct PollingController<F: Fetch> {
    name: &'static str,
    fetcher: Arc<F>,
    state: SharedView<F::Output>,
    interval: Option<Duration>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<F: Fetch> PollingController<F> {
    pub fn new(
        name: &'static str,
        fetcher: F,
        interval: Option<Duration>,
        policy: ErrorPolicy,
    ) -> Self {
        let (state, _) = watch::channel(RefreshableView::with_policy(policy));
        Self {
            name,
            fetcher: Arc::new(fetcher),
            state: Arc::new(state),
            interval,
            timer: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshableView<F::Output>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RefreshableView<F::Output> {
        self.state.borrow().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.timer_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Fetches immediately, then every interval until detached. Without an
    /// interval only the immediate fetch runs. Attaching twice is a no-op.
    pub fn attach(&self) {
        let mut slot = self.timer_slot();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let name = self.name;
        let fetcher = Arc::clone(&self.fetcher);
        let state = Arc::clone(&self.state);
        let interval = self.interval;

        debug!(view = name, ?interval, "Attaching poller");
        *slot = Some(tokio::spawn(async move {
            let Some(period) = interval else {
                run_cycle(name, fetcher.as_ref(), &state).await;
                return;
            };
            let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            run_cycle(name, fetcher.as_ref(), &state).await;
            loop {
                ticker.tick().await;
                // A failed first load waits for a manual retry.
                let errored = state.borrow().phase() == LoadPhase::Errored;
                if errored {
                    debug!(view = name, "Skipping poll until retried");
                    continue;
                }
                run_cycle(name, fetcher.as_ref(), &state).await;
            }
        }));
    }

    /// Stops the timer and orphans every in-flight fetch.
    pub fn detach(&self) {
        if let Some(handle) = self.timer_slot().take() {
            handle.abort();
            debug!(view = self.name, "Detached poller");
        }
        self.state.send_modify(|view| view.invalidate());
    }

    /// Manual refresh. Shows `Loading` when nothing was loaded yet, so it
    /// doubles as the retry action of an errored view.
    pub async fn refresh(&self) {
        run_cycle(self.name, self.fetcher.as_ref(), &self.state).await;
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.timer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<F: Fetch> RefreshTarget for PollingController<F> {
    async fn request_refresh(&self) {
        self.refresh().await;
    }
}

impl<F: Fetch> Drop for PollingController<F> {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn run_cycle<F: Fetch>(
    name: &'static str,
    fetcher: &F,
    state: &watch::Sender<RefreshableView<F::Output>>,
) {
    let mut ticket = Ticket::default();
    state.send_modify(|view| ticket = view.begin());

    let result = fetcher.fetch().await;
    if let Err(err) = &result {
        warn!(view = name, error = %err, "Refresh failed");
    }

    let applied = state.send_if_modified(|view| view.complete(ticket, result));
    if !applied {
        debug!(view = name, "Discarded superseded response");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;

    /// Hands out queued results; each call waits on its own gate.
    struct Scripted {
        gates: tokio::sync::Mutex<VecDeque<oneshot::Receiver<Result<u32, ConsoleError>>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(gates: Vec<oneshot::Receiver<Result<u32, ConsoleError>>>) -> Self {
            Self {
                gates: tokio::sync::Mutex::new(gates.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetch for Scripted {
        type Output = u32;

        async fn fetch(&self) -> Result<u32, ConsoleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().await.pop_front();
            match gate {
                Some(gate) => gate
                    .await
                    .unwrap_or_else(|_| Err(ConsoleError::InvalidState("gate dropped".into()))),
                None => std::future::pending().await,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = PollingController::new(
            "counter",
            FetchFn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) as u32;
                async move { Ok::<_, ConsoleError>(n) }
            }),
            Some(Duration::from_secs(30)),
            ErrorPolicy::SwallowBackground,
        );

        let mut rx = controller.subscribe();
        controller.attach();
        rx.wait_for(|view| view.data() == Some(&0)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        rx.wait_for(|view| view.data() == Some(&1)).await.unwrap();
        assert!(calls.load(Ordering::SeqCst) >= 2);

        controller.detach();
        assert!(!controller.is_attached());
        let after = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_does_not_retry_a_failed_first_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = PollingController::new(
            "flaky",
            FetchFn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ConsoleError::api(503, None))
                    } else {
                        Ok(7u32)
                    }
                }
            }),
            Some(Duration::from_secs(30)),
            ErrorPolicy::Surface,
        );

        let mut rx = controller.subscribe();
        controller.attach();
        rx.wait_for(|view| view.phase() == LoadPhase::Errored).await.unwrap();

        tokio::time::sleep(Duration::from_secs(91)).await;
        let view = controller.snapshot();
        assert_eq!(view.phase(), LoadPhase::Errored);
        assert_eq!(view.error(), Some("API Error: 503"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(controller.is_attached());

        controller.refresh().await;
        assert_eq!(controller.snapshot().data(), Some(&7));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(calls.load(Ordering::SeqCst) >= 3);
        controller.detach();
    }

    #[tokio::test]
    async fn first_failure_then_retry() {
        let (fail_tx, fail_rx) = oneshot::channel();
        let (ok_tx, ok_rx) = oneshot::channel();
        let controller = PollingController::new(
            "retry",
            Scripted::new(vec![fail_rx, ok_rx]),
            None,
            ErrorPolicy::Surface,
        );

        fail_tx.send(Err(ConsoleError::api(503, None))).unwrap();
        controller.refresh().await;
        let view = controller.snapshot();
        assert_eq!(view.phase(), LoadPhase::Errored);
        assert_eq!(view.error(), Some("API Error: 503"));

        ok_tx.send(Ok(5)).unwrap();
        controller.refresh().await;
        let view = controller.snapshot();
        assert_eq!(view.phase(), LoadPhase::Ready);
        assert_eq!(view.data(), Some(&5));
        assert_eq!(controller.fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn response_after_detach_is_discarded() {
        let (tx, rx) = oneshot::channel();
        let controller = Arc::new(PollingController::new(
            "late",
            Scripted::new(vec![rx]),
            None,
            ErrorPolicy::Surface,
        ));

        let mut watcher = controller.subscribe();
        let pending = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.refresh().await })
        };
        watcher
            .wait_for(|view| view.phase() == LoadPhase::Loading)
            .await
            .unwrap();

        controller.detach();
        tx.send(Ok(99)).unwrap();
        pending.await.unwrap();

        let view = controller.snapshot();
        assert_eq!(view.data(), None);
        assert_ne!(view.phase(), LoadPhase::Ready);
    }
}
