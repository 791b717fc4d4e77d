use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::geometry::LookAngle;
use crate::observer::ObserverState;
use crate::predict::Propagator;
use crate::presenter::{LookAngleReport, Presenter};
use crate::tracking::error::{LookAngleError, TrackingError};
use crate::tracking::roster::Roster;
use crate::tracking::types::{RefreshSummary, SatelliteSpec, SatelliteStatus};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(10_000);

#[derive(Debug, Default)]
struct Shared {
    roster: Roster,
    observer: ObserverState,
}

#[derive(Debug)]
struct WorkerHandle {
    id: u64,
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Identifies one periodic refresh schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshHandle {
    id: u64,
}

/// Session object: roster, observer slot and the single refresh worker.
pub struct TrackingController {
    shared: Arc<StdMutex<Shared>>,
    propagator: Arc<dyn Propagator>,
    presenter: Arc<dyn Presenter>,
    worker: Option<WorkerHandle>,
    next_schedule: u64,
}

impl TrackingController {
    pub fn new(propagator: Arc<dyn Propagator>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            shared: Arc::new(StdMutex::new(Shared::default())),
            propagator,
            presenter,
            worker: None,
            next_schedule: 0,
        }
    }

    pub fn initialize(&self, specs: Vec<SatelliteSpec>) {
        lock(&self.shared).roster.initialize(specs);
    }

    pub fn set_observer(&self, observer: ObserverState) {
        lock(&self.shared).observer = observer;
    }

    pub fn observer(&self) -> ObserverState {
        lock(&self.shared).observer
    }

    pub fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }

    pub fn snapshot(&self) -> Vec<SatelliteStatus> {
        lock(&self.shared).roster.statuses()
    }

    pub fn refresh_all(&self, now: DateTime<Utc>) -> RefreshSummary {
        refresh_shared(&self.shared, self.propagator.as_ref(), self.presenter.as_ref(), now)
    }

    pub fn compute_look_angle(
        &self,
        observer: &ObserverState,
        id: &str,
    ) -> Result<LookAngle, LookAngleError> {
        lock(&self.shared).roster.compute_look_angle(observer, id)
    }

    /// Look angle from the stored observer, without presenting it.
    pub fn report(&self, id: &str) -> Result<LookAngleReport, LookAngleError> {
        let shared = lock(&self.shared);
        shared.roster.report(&shared.observer, id)
    }

    /// Look angle from the stored observer, handed to the presenter.
    pub fn publish_look_angle(&self, id: &str) -> Result<LookAngleReport, LookAngleError> {
        let report = self.report(id)?;
        self.presenter.look_angle(&report);
        Ok(report)
    }

    pub fn is_refreshing(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.join.is_finished())
    }

    /// Refreshes now and then every `interval` until stopped.
    pub fn start_periodic_refresh(
        &mut self,
        interval: Duration,
    ) -> Result<RefreshHandle, TrackingError> {
        if self.is_refreshing() {
            return Err(TrackingError::AlreadyRunning);
        }
        if interval.is_zero() {
            return Err(TrackingError::ZeroInterval);
        }
        let runtime = Handle::try_current().map_err(|_| TrackingError::NoRuntime)?;

        let shared = self.shared.clone();
        let propagator = self.propagator.clone();
        let presenter = self.presenter.clone();
        let (stop_tx, stop_rx) = oneshot::channel();

        let join = runtime.spawn(async move {
            run_refresh_loop(shared, propagator, presenter, interval, stop_rx).await;
        });

        self.next_schedule += 1;
        let id = self.next_schedule;
        self.worker = Some(WorkerHandle { id, stop_tx, join });

        log::info!("Periodic refresh started (every {:?})", interval);
        Ok(RefreshHandle { id })
    }

    /// No tick fires once this returns.
    pub async fn stop_periodic_refresh(
        &mut self,
        handle: RefreshHandle,
    ) -> Result<(), TrackingError> {
        match self.worker.take() {
            Some(worker) if worker.id == handle.id => {
                stop_worker(worker).await;
                Ok(())
            }
            other => {
                self.worker = other;
                Err(TrackingError::UnknownSchedule)
            }
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            stop_worker(worker).await;
        }
    }
}

impl Drop for TrackingController {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join.abort();
        }
    }
}

fn lock(shared: &StdMutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

// The roster lock is held for the whole propagation pass, so two refreshes
// never propagate the same satellite concurrently. Presenters run after it
// is released and may read the controller.
fn refresh_shared(
    shared: &StdMutex<Shared>,
    propagator: &dyn Propagator,
    presenter: &dyn Presenter,
    now: DateTime<Utc>,
) -> RefreshSummary {
    let events = lock(shared).roster.refresh_all(now, propagator);
    for event in &events {
        event.present(presenter);
    }
    RefreshSummary::of(&events)
}

async fn stop_worker(worker: WorkerHandle) {
    let _ = worker.stop_tx.send(());
    if let Err(e) = worker.join.await {
        if !e.is_cancelled() {
            log::error!("Refresh worker failed: {}", e);
        }
    }
    log::info!("Periodic refresh stopped");
}

async fn run_refresh_loop(
    shared: Arc<StdMutex<Shared>>,
    propagator: Arc<dyn Propagator>,
    presenter: Arc<dyn Presenter>,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let should_stop = tokio::select! {
            biased;
            _ = &mut stop_rx => true,
            _ = ticker.tick() => false,
        };
        if should_stop {
            return;
        }

        let summary = refresh_shared(&shared, propagator.as_ref(), presenter.as_ref(), Utc::now());
        log::debug!(
            "Refresh tick: {} updated, {} stale",
            summary.updated,
            summary.stale
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::OnceLock;

    use super::*;
    use crate::geometry::{GeoPosition, SatellitePosition};
    use crate::observer::GeolocationError;
    use crate::predict::{OrbitalElements, PropagationError};
    use crate::tracking::roster::testing::*;
    use crate::tracking::Transition;

    struct CountingPropagator {
        calls: AtomicUsize,
    }

    impl CountingPropagator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Propagator for CountingPropagator {
        fn propagate(&self, _: &OrbitalElements, _: DateTime<Utc>) -> Propagated {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(position(0.0, -46.63))
        }
    }

    /// Sleeps inside every call and remembers the highest overlap seen.
    #[derive(Default)]
    struct SlowPropagator {
        running: AtomicUsize,
        max_running: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Propagator for SlowPropagator {
        fn propagate(&self, _: &OrbitalElements, _: DateTime<Utc>) -> Propagated {
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(running, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(position(0.0, 0.0))
        }
    }

    /// Checks on every callback whether the roster lock is free.
    #[derive(Default)]
    struct LockCheckingPresenter {
        shared: OnceLock<Arc<StdMutex<Shared>>>,
        callbacks: AtomicUsize,
        saw_locked: AtomicBool,
    }

    impl LockCheckingPresenter {
        fn check(&self) {
            self.callbacks.fetch_add(1, Ordering::SeqCst);
            if let Some(shared) = self.shared.get() {
                if shared.try_lock().is_err() {
                    self.saw_locked.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    impl Presenter for LockCheckingPresenter {
        fn position_updated(&self, _: &str, _: &SatellitePosition, _: Transition) {
            self.check();
        }

        fn position_stale(&self, _: &str, _: &PropagationError) {
            self.check();
        }

        fn look_angle(&self, _: &LookAngleReport) {}

        fn location_failed(&self, _: &GeolocationError) {}
    }

    fn controller() -> (TrackingController, Arc<CountingPropagator>, Arc<RecordingPresenter>) {
        let propagator = CountingPropagator::new();
        let presenter = Arc::new(RecordingPresenter::default());
        let controller = TrackingController::new(propagator.clone(), presenter.clone());
        controller.initialize(specs());
        (controller, propagator, presenter)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_immediately_then_on_interval() {
        let (mut controller, propagator, _) = controller();
        let handle = controller
            .start_periodic_refresh(DEFAULT_REFRESH_INTERVAL)
            .unwrap();

        tokio::time::sleep(Duration::from_secs(25)).await;
        // ticks at 0s, 10s and 20s, two satellites each
        assert_eq!(propagator.calls(), 6);

        controller.stop_periodic_refresh(handle).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(propagator.calls(), 6);
        assert!(!controller.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn second_schedule_is_rejected() {
        let (mut controller, _, _) = controller();
        let first = controller.start_periodic_refresh(Duration::from_secs(1)).unwrap();
        assert_eq!(
            controller.start_periodic_refresh(Duration::from_secs(1)),
            Err(TrackingError::AlreadyRunning)
        );

        controller.stop_periodic_refresh(first).await.unwrap();
        let second = controller.start_periodic_refresh(Duration::from_secs(1)).unwrap();
        assert_ne!(first, second);

        assert_eq!(
            controller.stop_periodic_refresh(first).await,
            Err(TrackingError::UnknownSchedule)
        );
        assert!(controller.is_refreshing());
        controller.shutdown().await;
        assert!(!controller.is_refreshing());
    }

    #[test]
    fn start_outside_runtime_is_rejected() {
        let (mut controller, propagator, _) = controller();
        assert_eq!(
            controller.start_periodic_refresh(Duration::from_secs(1)),
            Err(TrackingError::NoRuntime)
        );
        assert!(!controller.is_refreshing());
        assert_eq!(propagator.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn refreshes_never_propagate_concurrently() {
        let propagator = Arc::new(SlowPropagator::default());
        let presenter = Arc::new(RecordingPresenter::default());
        let mut controller = TrackingController::new(propagator.clone(), presenter);
        controller.initialize(specs());

        // each tick takes ~60 ms, far longer than the interval
        let handle = controller
            .start_periodic_refresh(Duration::from_millis(10))
            .unwrap();
        tokio::task::block_in_place(|| {
            std::thread::scope(|scope| {
                for _ in 0..5 {
                    scope.spawn(|| controller.refresh_all(Utc::now()));
                }
            });
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.stop_periodic_refresh(handle).await.unwrap();

        let calls = propagator.calls.load(Ordering::SeqCst);
        assert!(calls >= 10, "only {calls} calls");
        assert_eq!(propagator.max_running.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(propagator.calls.load(Ordering::SeqCst), calls);
    }

    #[test]
    fn presenter_runs_without_roster_lock() {
        let presenter = Arc::new(LockCheckingPresenter::default());
        let controller = TrackingController::new(CountingPropagator::new(), presenter.clone());
        controller.initialize(specs());
        assert!(presenter.shared.set(controller.shared.clone()).is_ok());

        controller.refresh_all(Utc::now());
        assert_eq!(presenter.callbacks.load(Ordering::SeqCst), 2);
        assert!(!presenter.saw_locked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let (mut controller, _, _) = controller();
        assert_eq!(
            controller.start_periodic_refresh(Duration::ZERO),
            Err(TrackingError::ZeroInterval)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_acquires_then_updates() {
        let (mut controller, _, presenter) = controller();
        let handle = controller.start_periodic_refresh(Duration::from_secs(10)).unwrap();
        tokio::time::sleep(Duration::from_secs(15)).await;
        controller.stop_periodic_refresh(handle).await.unwrap();

        assert_eq!(
            presenter.events(),
            vec![
                Event::Updated("Landsat 8".into(), Transition::Acquired),
                Event::Updated("Landsat 9".into(), Transition::Acquired),
                Event::Updated("Landsat 8".into(), Transition::Updated),
                Event::Updated("Landsat 9".into(), Transition::Updated),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_controller_stops_worker() {
        let (mut controller, propagator, _) = controller();
        controller.start_periodic_refresh(Duration::from_secs(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        let calls = propagator.calls();
        assert_eq!(calls, 2);

        drop(controller);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(propagator.calls(), calls);
    }

    #[test]
    fn look_angle_uses_stored_observer() {
        let (controller, propagator, presenter) = controller();
        assert_eq!(
            controller.publish_look_angle("Landsat 8").unwrap_err(),
            LookAngleError::NoObserverPosition
        );

        controller.set_observer(ObserverState::at(GeoPosition::new(-23.55, -46.63)));
        assert_eq!(
            controller.report("Landsat 8").unwrap_err(),
            LookAngleError::NotPropagated("Landsat 8".into())
        );

        controller.refresh_all(Utc::now());
        let report = controller.publish_look_angle("Landsat 8").unwrap();
        assert!((report.look_angle.distance_km - 2618.6405).abs() < 1e-3);
        // cached, not re-propagated
        assert_eq!(propagator.calls(), 2);
        assert!(presenter
            .events()
            .contains(&Event::LookAngle("Landsat 8".into())));

        let explicit = controller
            .compute_look_angle(&ObserverState::default(), "Landsat 8")
            .unwrap_err();
        assert_eq!(explicit, LookAngleError::NoObserverPosition);
    }

    #[test]
    fn observer_is_replaced_whole() {
        let (controller, _, _) = controller();
        controller.set_observer(ObserverState {
            position: Some(GeoPosition::new(1.0, 2.0)),
            accuracy_m: Some(5.0),
        });
        controller.set_observer(ObserverState::at(GeoPosition::new(3.0, 4.0)));
        assert_eq!(
            controller.observer(),
            ObserverState {
                position: Some(GeoPosition::new(3.0, 4.0)),
                accuracy_m: None,
            }
        );
    }

    #[test]
    fn snapshot_reflects_refresh() {
        let (controller, _, _) = controller();
        assert!(controller.snapshot().iter().all(|s| s.position.is_none()));
        let summary = controller.refresh_all(Utc::now());
        assert_eq!(summary, RefreshSummary { updated: 2, stale: 0 });
        let snapshot = controller.snapshot();
        assert_eq!(snapshot[0].norad_id, 39084);
        assert!(snapshot.iter().all(|s| s.position.is_some() && !s.stale));
    }
}
