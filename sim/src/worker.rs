//! The barber.
//!
//! Three-state machine: Sleeping -> Awake via `wake`, Awake -> Sleeping via
//! `sleep`, Awake -> Cutting via `claim_next` and Cutting -> Awake via
//! `service`. The customer in the chair lives inside the `Cutting` state, so
//! "current customer present iff cutting" holds by construction.
//!
//! Only the dispatcher thread sleeps the worker or services customers; the
//! arrival generator and the shutdown path only wake it.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use shop_telemetry::{EventSink, ShopEvent, WorkerState};

use crate::customer::{Customer, CustomerId};
use crate::signal::Signal;
use crate::waiting_room::WaitingRoom;
use crate::{lock, uniform_duration};

/// Receives service start/end reports
pub trait ServiceObserver: Send + Sync {
    fn on_service_start(&self, id: CustomerId);
    fn on_service_end(&self, id: CustomerId);
}

#[derive(Debug)]
enum Activity {
    Sleeping,
    Awake,
    Cutting(Customer),
}

impl Activity {
    fn state(&self) -> WorkerState {
        match self {
            Activity::Sleeping => WorkerState::Sleeping,
            Activity::Awake => WorkerState::Awake,
            Activity::Cutting(_) => WorkerState::Cutting,
        }
    }
}

#[derive(Debug)]
struct Chair {
    activity: Activity,
    // Bumped on every wake() so a waiter can tell a missed notify from a timeout
    wakeups: u64,
}

pub struct Worker {
    chair: Mutex<Chair>,
    wake: Condvar,
    cut_min: Duration,
    cut_max: Duration,
    observer: Arc<dyn ServiceObserver>,
    sink: Arc<dyn EventSink>,
}

impl Worker {
    pub fn new(
        cut_range: (Duration, Duration),
        observer: Arc<dyn ServiceObserver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            chair: Mutex::new(Chair {
                activity: Activity::Sleeping,
                wakeups: 0,
            }),
            wake: Condvar::new(),
            cut_min: cut_range.0,
            cut_max: cut_range.1,
            observer,
            sink,
        }
    }

    pub fn state(&self) -> WorkerState {
        lock(&self.chair).activity.state()
    }

    /// Customer in the chair, if cutting
    pub fn current_customer(&self) -> Option<CustomerId> {
        self.status().1
    }

    /// State and customer in the chair, read under one guard
    pub fn status(&self) -> (WorkerState, Option<CustomerId>) {
        let chair = lock(&self.chair);
        let current = match &chair.activity {
            Activity::Cutting(customer) => Some(customer.id()),
            _ => None,
        };
        (chair.activity.state(), current)
    }

    pub fn cut_range(&self) -> (Duration, Duration) {
        (self.cut_min, self.cut_max)
    }

    /// Sleeping -> Awake. Always notifies a blocked dispatcher.
    pub fn wake(&self) {
        let woke = {
            let mut chair = lock(&self.chair);
            chair.wakeups += 1;
            let woke = Self::rouse(&mut chair);
            self.wake.notify_all();
            woke
        };

        if woke {
            self.sink.emit(&ShopEvent::WorkerWoke);
        }
    }

    /// Awake -> Sleeping. No-op in any other state.
    pub fn sleep(&self) {
        let slept = {
            let mut chair = lock(&self.chair);
            let slept = matches!(chair.activity, Activity::Awake);
            if slept {
                chair.activity = Activity::Sleeping;
            }
            slept
        };

        if slept {
            self.sink.emit(&ShopEvent::WorkerSlept);
        }
    }

    /// Wake token to pass to [`Worker::wait_for_wake`].
    ///
    /// Read it before checking the waiting room: any `wake` issued after the
    /// read ends the following wait immediately.
    pub fn wake_ticket(&self) -> u64 {
        lock(&self.chair).wakeups
    }

    /// Block until woken after `ticket`, `stop` is raised, or `timeout`
    /// passes. Returns true if woken.
    pub fn wait_for_wake(&self, ticket: u64, timeout: Duration, stop: &Signal) -> bool {
        let chair = lock(&self.chair);
        let chair = self
            .wake
            .wait_timeout_while(chair, timeout, |chair| {
                chair.wakeups == ticket && !stop.is_set()
            })
            .map(|(chair, _)| chair)
            .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        chair.wakeups != ticket
    }

    /// Unblock any waiter without a state change (shutdown path)
    pub fn interrupt(&self) {
        let _chair = lock(&self.chair);
        self.wake.notify_all();
    }

    /// Move the head of `room` into the chair: Awake -> Cutting, going
    /// through Awake first when the worker was sleeping. `None` if the room
    /// is empty or the chair is taken.
    ///
    /// The worker guard is held across the hand-off so the customer is never
    /// observable in neither place.
    pub fn claim_next(&self, room: &WaitingRoom) -> Option<CustomerId> {
        let (id, woke) = {
            let mut chair = lock(&self.chair);
            if matches!(chair.activity, Activity::Cutting(_)) {
                return None;
            }
            let customer = room.take_next()?;
            let id = customer.id();
            (id, Self::seat(&mut chair, customer))
        };

        if woke {
            self.sink.emit(&ShopEvent::WorkerWoke);
        }
        self.sink.emit(&ShopEvent::CustomerTaken { id });
        Some(id)
    }

    /// Serve the customer in the chair on the calling thread, then return
    /// to Awake. Blocks for the sampled service duration.
    ///
    /// Returns the customer served, or `None` if the chair was empty.
    pub fn service(&self) -> Option<CustomerId> {
        let id = match &lock(&self.chair).activity {
            Activity::Cutting(customer) => customer.id(),
            _ => return None,
        };

        self.observer.on_service_start(id);

        let duration = uniform_duration(&mut rand::thread_rng(), self.cut_min, self.cut_max);
        self.sink.emit(&ShopEvent::ServiceStarted { id, duration });

        thread::sleep(duration);

        self.sink.emit(&ShopEvent::ServiceFinished { id });
        self.observer.on_service_end(id);

        lock(&self.chair).activity = Activity::Awake;
        Some(id)
    }

    // Returns true if the worker had to be woken first
    fn seat(chair: &mut Chair, customer: Customer) -> bool {
        let woke = Self::rouse(chair);
        chair.activity = Activity::Cutting(customer);
        woke
    }

    // Sleeping -> Awake; false in any other state
    fn rouse(chair: &mut Chair) -> bool {
        let woke = matches!(chair.activity, Activity::Sleeping);
        if woke {
            chair.activity = Activity::Awake;
        }
        woke
    }
}
