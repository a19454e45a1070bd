//! Background cadence for the live tracker and the clock animation.

use super::Tracker;
use crate::error::Result;
use crate::models::Snapshot;
use crate::time::SimulationClock;
use hifitime::Epoch;
use log::{debug, warn};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Runs a callback every `interval` on its own thread.
///
/// Once `stop` returns the worker has exited and no further tick fires.
/// Dropping the ticker stops it.
pub struct Ticker {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// The first tick fires one interval after start.
    pub fn start<F>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            debug!("ticker started, interval {} ms", interval.as_millis());
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => on_tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("ticker stopped");
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // A send error means the worker is already gone
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("ticker worker panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn publish(latest: &RwLock<Arc<Snapshot>>, snapshot: Snapshot) {
    let snapshot = Arc::new(snapshot);
    match latest.write() {
        Ok(mut guard) => *guard = snapshot,
        Err(poisoned) => *poisoned.into_inner() = snapshot,
    }
}

type ClockSource = Arc<dyn Fn() -> Result<Epoch> + Send + Sync>;

/// Recomputes a `Tracker` snapshot on every tick and publishes it whole.
///
/// Readers get an `Arc<Snapshot>`; a tick swaps the pointer, so a reader
/// never sees objects from two different instants.
pub struct LiveTracker {
    latest: Arc<RwLock<Arc<Snapshot>>>,
    clock: ClockSource,
    interval: Duration,
    ticker: Option<Ticker>,
}

impl LiveTracker {
    /// Publishes a first snapshot synchronously, then keeps it fresh.
    pub fn start<C>(tracker: Tracker, interval: Duration, clock: C) -> Result<Self>
    where
        C: Fn() -> Result<Epoch> + Send + Sync + 'static,
    {
        let clock: ClockSource = Arc::new(clock);
        let first = tracker.snapshot(clock()?);
        let mut live = Self {
            latest: Arc::new(RwLock::new(Arc::new(first))),
            clock,
            interval,
            ticker: None,
        };
        live.spawn(tracker);
        Ok(live)
    }

    /// Tracks against a shared simulation clock, e.g. one driven by an
    /// `Animator`.
    pub fn with_simulation_clock(
        tracker: Tracker,
        interval: Duration,
        clock: Arc<Mutex<SimulationClock>>,
    ) -> Result<Self> {
        Self::start(tracker, interval, move || lock(&clock).now())
    }

    fn spawn(&mut self, tracker: Tracker) {
        let latest = Arc::clone(&self.latest);
        let clock = Arc::clone(&self.clock);
        self.ticker = Some(Ticker::start(self.interval, move || match clock() {
            Ok(epoch) => publish(&latest, tracker.snapshot(epoch)),
            Err(e) => warn!("skipping tracker tick: {e}"),
        }));
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        match self.latest.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swaps the tracked set and publishes its first snapshot before
    /// returning. The old worker is joined before the new one starts, so
    /// ticks for the two sets never interleave.
    ///
    /// If the clock fails, the old set stays in place and keeps ticking.
    pub fn replace_objects(&mut self, tracker: Tracker) -> Result<()> {
        let epoch = (self.clock)()?;
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        debug!("tracking {} object(s)", tracker.len());
        publish(&self.latest, tracker.snapshot(epoch));
        self.spawn(tracker);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }
}

/// Plays a `SimulationClock` forward in real time.
pub struct Animator {
    clock: Arc<Mutex<SimulationClock>>,
    interval: Duration,
    ticker: Option<Ticker>,
}

impl Animator {
    pub fn new(clock: Arc<Mutex<SimulationClock>>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            ticker: None,
        }
    }

    pub fn clock(&self) -> Arc<Mutex<SimulationClock>> {
        Arc::clone(&self.clock)
    }

    pub fn play(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        let clock = Arc::clone(&self.clock);
        let mut last = Instant::now();
        self.ticker = Some(Ticker::start(self.interval, move || {
            let now = Instant::now();
            lock(&clock).advance(now.duration_since(last).as_secs_f64());
            last = now;
        }));
    }

    /// Returns once the animation thread has exited.
    pub fn stop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.ticker.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::parse_tle;
    use crate::tracker::TrackedObject;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ISS_1: &str = "1 25544U 98067A   23248.54842295  .00018164  00000-0  32729-3 0  9994";
    const ISS_2: &str = "2 25544  51.6416 357.6536 0005404 227.8174 205.8236 15.50066264424353";

    fn iss_tracker() -> (Tracker, Epoch) {
        let elements = parse_tle(ISS_1, ISS_2).unwrap();
        let epoch = elements.epoch;
        let tracker = Tracker::new(vec![TrackedObject::new("ISS", "stations", &elements).unwrap()]);
        (tracker, epoch)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn no_tick_after_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut ticker = Ticker::start(Duration::from_millis(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(wait_for(|| count.load(Ordering::SeqCst) >= 3));
        ticker.stop();
        assert!(!ticker.is_running());
        let stopped_at = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[test]
    fn drop_stops_ticker() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let ticker = Ticker::start(Duration::from_millis(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(wait_for(|| count.load(Ordering::SeqCst) >= 1));
        drop(ticker);
        let stopped_at = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[test]
    fn live_tracker_publishes_snapshots() {
        let (tracker, epoch) = iss_tracker();
        let ticks = Arc::new(AtomicUsize::new(0));
        let clock_ticks = Arc::clone(&ticks);
        let mut live = LiveTracker::start(tracker, Duration::from_millis(5), move || {
            let n = clock_ticks.fetch_add(1, Ordering::SeqCst);
            Ok(epoch + crate::time::minutes(n as f64))
        })
        .unwrap();

        let first = live.latest();
        assert_eq!(first.epoch, epoch);
        assert!(first.get("ISS").is_some());

        assert!(wait_for(|| live.latest().epoch > epoch));
        let later = live.latest();
        assert_eq!(later.objects.len(), 1);
        assert_ne!(later.objects[0].position, first.objects[0].position);

        live.stop();
        assert!(!live.is_running());
    }

    #[test]
    fn replace_objects_swaps_the_set() {
        let (tracker, epoch) = iss_tracker();
        let mut live = LiveTracker::start(tracker, Duration::from_millis(5), move || Ok(epoch)).unwrap();
        assert_eq!(live.latest().objects.len(), 1);

        live.replace_objects(Tracker::default()).unwrap();
        assert!(live.is_running());
        assert!(wait_for(|| live.latest().objects.is_empty()));
    }

    #[test]
    fn replacement_is_visible_immediately() {
        let (tracker, epoch) = iss_tracker();
        // Long interval: only the synchronous publications can be observed
        let mut live = LiveTracker::start(Tracker::default(), Duration::from_secs(3600), move || Ok(epoch)).unwrap();
        assert!(live.latest().objects.is_empty());

        live.replace_objects(tracker).unwrap();
        let latest = live.latest();
        assert_eq!(latest.epoch, epoch);
        assert!(latest.get("ISS").is_some());
        live.stop();
    }

    #[test]
    fn failed_replacement_keeps_current_set() {
        let (tracker, epoch) = iss_tracker();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut live = LiveTracker::start(tracker, Duration::from_secs(3600), move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(epoch)
            } else {
                Err(crate::error::Error::Config("clock offline".into()))
            }
        })
        .unwrap();

        assert!(live.replace_objects(Tracker::default()).is_err());
        assert!(live.is_running());
        assert!(live.latest().get("ISS").is_some());
        live.stop();
    }

    #[test]
    fn animator_advances_shared_clock() {
        let clock = Arc::new(Mutex::new(SimulationClock::new()));
        let mut animator = Animator::new(Arc::clone(&clock), Duration::from_millis(5));
        animator.play();
        assert!(animator.is_playing());
        assert!(wait_for(|| lock(&clock).offset_hours() > 0.0));
        animator.stop();
        assert!(!animator.is_playing());

        let paused = lock(&clock).offset_hours();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(lock(&clock).offset_hours(), paused);
    }
}
