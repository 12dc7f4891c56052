//! Barber Shop Telemetry
//!
//! Observation vocabulary for the shop: worker state, lifecycle events,
//! event sinks and the read-only snapshot handed to observers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// Worker state as seen from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    Sleeping,
    Awake,
    Cutting,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Sleeping => "sleeping",
            WorkerState::Awake => "awake",
            WorkerState::Cutting => "cutting",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShopEvent {
    ShopOpened,
    ShopClosed,
    CustomerSeated { id: u64, waiting: usize },
    CustomerBalked { id: u64 },
    CustomerTaken { id: u64 },
    WorkerSlept,
    WorkerWoke,
    ServiceStarted { id: u64, duration: Duration },
    ServiceFinished { id: u64 },
    AllCustomersHandled,
}

impl fmt::Display for ShopEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShopEvent::ShopOpened => write!(f, "The barber shop is now open"),
            ShopEvent::ShopClosed => write!(f, "The barber shop is closing"),
            ShopEvent::CustomerSeated { id, waiting } => {
                write!(f, "Customer {} is waiting ({} in room)", id, waiting)
            }
            ShopEvent::CustomerBalked { id } => {
                write!(f, "Waiting room is full, customer {} leaves", id)
            }
            ShopEvent::CustomerTaken { id } => {
                write!(f, "Customer {} is taken for a haircut", id)
            }
            ShopEvent::WorkerSlept => write!(f, "Barber goes to sleep"),
            ShopEvent::WorkerWoke => write!(f, "Barber is awakened"),
            ShopEvent::ServiceStarted { id, duration } => write!(
                f,
                "Barber is cutting customer {}'s hair for {:.2}s",
                id,
                duration.as_secs_f64()
            ),
            ShopEvent::ServiceFinished { id } => {
                write!(f, "Barber finished cutting customer {}'s hair", id)
            }
            ShopEvent::AllCustomersHandled => write!(f, "All customers have been handled"),
        }
    }
}

/// Logging collaborator.
///
/// Delivery and formatting are up to the sink; the shop never depends on
/// either.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ShopEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ShopEvent) {
        match event {
            ShopEvent::CustomerSeated { id, waiting } => {
                tracing::info!(target: "barbershop", customer = id, waiting, "{}", event)
            }
            ShopEvent::CustomerBalked { id }
            | ShopEvent::CustomerTaken { id }
            | ShopEvent::ServiceFinished { id } => {
                tracing::info!(target: "barbershop", customer = id, "{}", event)
            }
            ShopEvent::ServiceStarted { id, duration } => tracing::info!(
                target: "barbershop",
                customer = id,
                duration_secs = duration.as_secs_f64(),
                "{}",
                event
            ),
            _ => tracing::info!(target: "barbershop", "{}", event),
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ShopEvent) {}
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ShopEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far
    pub fn events(&self) -> Vec<ShopEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Rendered text lines, as a log view would show them
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, predicate: impl Fn(&ShopEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &ShopEvent) {
        // A poisoned sink only loses log lines
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Read-only view of the shop at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub worker: WorkerState,
    pub current_customer: Option<u64>,
    pub waiting: Vec<u64>, // FIFO order, head first
    pub capacity: usize,
    pub generated: usize,
    pub served: usize,
    pub left: usize,
    pub done: bool,
}

impl ShopSnapshot {
    /// Free chairs in the waiting room
    pub fn free_chairs(&self) -> usize {
        self.capacity.saturating_sub(self.waiting.len())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
