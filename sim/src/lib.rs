//! Sleeping Barber Simulator
//!
//! One barber, a bounded waiting room, and customers that balk when every
//! chair is taken. Each moving part runs on its own OS thread:
//!
//! - the dispatcher pairs the idle worker with the next waiting customer
//! - the arrival generator seats (or turns away) a fixed number of customers
//! - the completion monitor detects when no work is left
//!
//! [`Simulation`] owns all of them and exposes start/stop/stats.

use rand::Rng;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub mod arrivals;
pub mod customer;
pub mod dispatcher;
pub mod ledger;
pub mod logging;
pub mod monitor;
pub mod signal;
pub mod simulation;
pub mod stats;
pub mod waiting_room;
pub mod worker;

pub use arrivals::ArrivalGenerator;
pub use customer::{Customer, CustomerId};
pub use dispatcher::Dispatcher;
pub use ledger::Ledger;
pub use logging::init_tracing;
pub use monitor::CompletionMonitor;
pub use signal::Signal;
pub use simulation::{Simulation, Timing};
pub use stats::{write_csv, CustomerRecord, Outcome, ShopStats};
pub use waiting_room::WaitingRoom;
pub use worker::{ServiceObserver, Worker};

pub use shop_config::{ConfigError, LoggingConfig, ShopConfig, ShopParams};
pub use shop_telemetry::{EventSink, MemorySink, NullSink, ShopEvent, ShopSnapshot, TracingSink, WorkerState};

/// Simulation errors
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation already started")]
    AlreadyStarted,

    #[error("background thread '{thread}' panicked")]
    ThreadPanicked { thread: &'static str },

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Lock a mutex, ignoring poisoning.
///
/// Guarded state is only ever replaced whole, so a panicking holder cannot
/// leave it half-updated.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Uniform sample from `[min, max]`
pub(crate) fn uniform_duration<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}
