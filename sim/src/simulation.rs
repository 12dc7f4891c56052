//! Simulation controller.
//!
//! Owns the waiting room, the worker and the three background threads, and
//! records per-customer timestamps through the [`Ledger`].

use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use shop_config::{ShopConfig, ShopParams};
use shop_telemetry::{EventSink, ShopEvent, ShopSnapshot, TracingSink, WorkerState};

use crate::arrivals::ArrivalGenerator;
use crate::customer::CustomerId;
use crate::dispatcher::Dispatcher;
use crate::ledger::Ledger;
use crate::monitor::CompletionMonitor;
use crate::signal::Signal;
use crate::stats::{CustomerRecord, ShopStats};
use crate::waiting_room::WaitingRoom;
use crate::worker::Worker;
use crate::{lock, Result, SimError};

/// Polling periods of the background threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Longest the idle dispatcher blocks before re-checking the stop signal
    pub idle_wait: Duration,
    /// Completion monitor period
    pub poll_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            idle_wait: Duration::from_secs(1),
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

struct Threads {
    phase: Phase,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

pub struct Simulation {
    params: ShopParams,
    timing: Timing,
    room: Arc<WaitingRoom>,
    worker: Arc<Worker>,
    ledger: Arc<Ledger>,
    stop: Arc<Signal>,
    done: Arc<Signal>,
    sink: Arc<dyn EventSink>,
    threads: Mutex<Threads>,
}

impl Simulation {
    /// Validate `params` and build an idle simulation. No thread is started.
    pub fn new(params: ShopParams, sink: Arc<dyn EventSink>) -> Result<Self> {
        params.validate()?;

        let ledger = Arc::new(Ledger::new());
        let room = Arc::new(WaitingRoom::new(params.waiting_room_capacity));
        let worker = Arc::new(Worker::new(params.cut_range(), ledger.clone(), sink.clone()));

        Ok(Self {
            params,
            timing: Timing::default(),
            room,
            worker,
            ledger,
            stop: Arc::new(Signal::new()),
            done: Arc::new(Signal::new()),
            sink,
            threads: Mutex::new(Threads {
                phase: Phase::Idle,
                handles: Vec::new(),
            }),
        })
    }

    /// Build from a loaded config, logging events through `tracing`
    pub fn from_config(config: &ShopConfig) -> Result<Self> {
        Self::new(config.barber_shop.clone(), Arc::new(TracingSink))
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn params(&self) -> &ShopParams {
        &self.params
    }

    /// Open the shop: spawn the dispatcher, arrival generator and monitor
    pub fn start(&self) -> Result<()> {
        let mut threads = lock(&self.threads);
        if threads.phase != Phase::Idle {
            return Err(SimError::AlreadyStarted);
        }
        threads.phase = Phase::Running;

        self.sink.emit(&ShopEvent::ShopOpened);

        let dispatcher = Dispatcher::new(
            self.worker.clone(),
            self.room.clone(),
            self.stop.clone(),
            self.timing.idle_wait,
        );
        let arrivals = ArrivalGenerator::new(
            self.room.clone(),
            self.worker.clone(),
            self.ledger.clone(),
            self.stop.clone(),
            self.sink.clone(),
            self.params.total_customers,
            self.params.arrival_range(),
        );
        let monitor = CompletionMonitor::new(
            self.ledger.clone(),
            self.room.clone(),
            self.worker.clone(),
            self.stop.clone(),
            self.done.clone(),
            self.sink.clone(),
            self.params.total_customers,
            self.timing.poll_interval,
        );

        let jobs: [(&'static str, Box<dyn FnOnce() + Send>); 3] = [
            ("dispatcher", Box::new(move || dispatcher.run())),
            ("arrivals", Box::new(move || arrivals.run())),
            ("monitor", Box::new(move || monitor.run())),
        ];

        for (name, body) in jobs {
            match self.spawn(name, body) {
                Ok(handle) => threads.handles.push((name, handle)),
                Err(err) => {
                    tracing::error!(thread = name, error = %err, "failed to spawn simulation thread");
                    drop(threads);
                    // Threads already running are joined; the spawn error wins
                    let _ = self.stop();
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }

    /// Close the shop and join every thread.
    ///
    /// A service in progress completes first. Nothing is mutated after this
    /// returns. Reports the first background thread that panicked.
    pub fn stop(&self) -> Result<()> {
        let mut threads = lock(&self.threads);

        self.stop.set();
        self.worker.interrupt();

        if threads.phase != Phase::Running {
            threads.phase = Phase::Stopped;
            return Ok(());
        }
        threads.phase = Phase::Stopped;

        let mut fault = None;
        for (name, handle) in threads.handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!(thread = name, "thread panicked before shutdown");
                fault.get_or_insert(name);
            }
        }

        self.sink.emit(&ShopEvent::ShopClosed);

        match fault {
            Some(thread) => Err(SimError::ThreadPanicked { thread }),
            None => Ok(()),
        }
    }

    /// Every customer generated, none waiting, none in the chair
    pub fn is_done(&self) -> bool {
        self.done.is_set()
    }

    /// Block the caller until done or `timeout`; returns `is_done()`
    pub fn wait_until_done(&self, timeout: Duration) -> bool {
        self.done.wait_timeout(timeout)
    }

    /// Statistics over the customers served so far.
    ///
    /// Advisory while running; stable once `is_done()`.
    pub fn compute_stats(&self) -> ShopStats {
        let waiting = self.room.len();
        self.ledger.stats(waiting)
    }

    pub fn customer_records(&self) -> Vec<CustomerRecord> {
        self.ledger.records()
    }

    /// Arrival, service start and service end of one customer
    pub fn timeline(&self, id: CustomerId) -> (Option<Instant>, Option<Instant>, Option<Instant>) {
        self.ledger.timeline(id)
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn current_customer(&self) -> Option<CustomerId> {
        self.worker.current_customer()
    }

    /// Waiting room contents, head first
    pub fn waiting_customers(&self) -> Vec<CustomerId> {
        self.room.snapshot()
    }

    pub fn generated(&self) -> usize {
        self.ledger.generated()
    }

    pub fn left(&self) -> usize {
        self.ledger.left()
    }

    /// Read-only view for observers; each part is read under its own guard
    pub fn snapshot(&self) -> ShopSnapshot {
        let (worker, current_customer) = self.worker.status();
        ShopSnapshot {
            worker,
            current_customer,
            waiting: self.room.snapshot(),
            capacity: self.room.capacity(),
            generated: self.ledger.generated(),
            served: self.ledger.served(),
            left: self.ledger.left(),
            done: self.is_done(),
        }
    }

    /// Spawn a named thread whose panic stops the whole run
    fn spawn(&self, name: &'static str, body: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
        let guard = FaultGuard {
            thread: name,
            stop: self.stop.clone(),
            worker: self.worker.clone(),
        };

        thread::Builder::new().name(name.to_string()).spawn(move || {
            let _guard = guard;
            body();
        })
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "simulation dropped with a failed thread");
        }
    }
}

/// Raises the stop signal if its thread unwinds
struct FaultGuard {
    thread: &'static str,
    stop: Arc<Signal>,
    worker: Arc<Worker>,
}

impl Drop for FaultGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!(thread = self.thread, "background thread panicked, stopping the run");
            self.stop.set();
            self.worker.interrupt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_telemetry::{MemorySink, NullSink};

    fn params() -> ShopParams {
        ShopParams {
            waiting_room_capacity: 2,
            arrival_time_min: 0.0,
            arrival_time_max: 0.0,
            cut_time_min: 0.01,
            cut_time_max: 0.01,
            total_customers: 4,
        }
    }

    fn fast() -> Timing {
        Timing {
            idle_wait: Duration::from_millis(50),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_idle_state() {
        let sim = Simulation::new(params(), Arc::new(NullSink)).unwrap();
        assert!(!sim.is_done());
        assert_eq!(sim.worker_state(), WorkerState::Sleeping);
        assert!(sim.waiting_customers().is_empty());

        let stats = sim.compute_stats();
        assert_eq!(stats.served, 0);
        assert_eq!(stats.avg_wait, None);
    }

    #[test]
    fn test_start_twice() {
        let sim = Simulation::new(params(), Arc::new(NullSink)).unwrap().with_timing(fast());
        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(SimError::AlreadyStarted)));
        sim.stop().unwrap();
        assert!(matches!(sim.start(), Err(SimError::AlreadyStarted)));
    }

    #[test]
    fn test_stop_without_start() {
        let sim = Simulation::new(params(), Arc::new(NullSink)).unwrap();
        sim.stop().unwrap();
        sim.stop().unwrap();
    }

    #[test]
    fn test_open_and_close_events() {
        let sink = Arc::new(MemorySink::new());
        let sim = Simulation::new(params(), sink.clone()).unwrap().with_timing(fast());

        sim.start().unwrap();
        assert!(sim.wait_until_done(Duration::from_secs(5)));
        sim.stop().unwrap();
        sim.stop().unwrap();

        let events = sink.events();
        assert_eq!(events.first(), Some(&ShopEvent::ShopOpened));
        assert_eq!(events.last(), Some(&ShopEvent::ShopClosed));
        assert_eq!(sink.count(|e| *e == ShopEvent::ShopClosed), 1);
        assert_eq!(sink.count(|e| *e == ShopEvent::AllCustomersHandled), 1);
    }

    #[test]
    fn test_snapshot_after_done() {
        let sim = Simulation::new(params(), Arc::new(NullSink)).unwrap().with_timing(fast());
        sim.start().unwrap();
        assert!(sim.wait_until_done(Duration::from_secs(5)));
        sim.stop().unwrap();

        let snapshot = sim.snapshot();
        assert!(snapshot.done);
        assert!(snapshot.waiting.is_empty());
        assert!(snapshot.current_customer.is_none());
        assert_eq!(snapshot.generated, 4);
        assert_eq!(snapshot.served + snapshot.left, 4);
    }
}
