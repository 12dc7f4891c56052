//! Per-customer timestamps and run counters.
//!
//! The arrival generator writes arrivals, balks and the generated count; the
//! dispatcher writes service start/end through [`ServiceObserver`]. Readers
//! may see a growing view until the run is done.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::customer::CustomerId;
use crate::lock;
use crate::stats::{CustomerRecord, Outcome, ShopStats};
use crate::worker::ServiceObserver;

#[derive(Debug, Default)]
struct Timestamps {
    arrivals: HashMap<CustomerId, Instant>,
    starts: HashMap<CustomerId, Instant>,
    ends: HashMap<CustomerId, Instant>,
    balked: HashSet<CustomerId>,
}

impl Timestamps {
    /// (wait, service) for customers present in all three maps
    fn served(&self) -> impl Iterator<Item = (CustomerId, Duration, Duration)> + '_ {
        self.arrivals.iter().filter_map(|(id, arrival)| {
            let start = self.starts.get(id)?;
            let end = self.ends.get(id)?;
            Some((
                *id,
                start.saturating_duration_since(*arrival),
                end.saturating_duration_since(*start),
            ))
        })
    }
}

#[derive(Debug, Default)]
pub struct Ledger {
    stamps: Mutex<Timestamps>,
    generated: AtomicUsize,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_arrival(&self, id: CustomerId, at: Instant) {
        lock(&self.stamps).arrivals.insert(id, at);
    }

    pub fn record_balk(&self, id: CustomerId) {
        lock(&self.stamps).balked.insert(id);
    }

    /// Count one arrival attempt, seated or not
    pub fn record_generated(&self) {
        self.generated.fetch_add(1, Ordering::Release);
    }

    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::Acquire)
    }

    pub fn left(&self) -> usize {
        lock(&self.stamps).balked.len()
    }

    pub fn served(&self) -> usize {
        lock(&self.stamps).served().count()
    }

    /// Aggregate statistics; `waiting` is the current room occupancy
    pub fn stats(&self, waiting: usize) -> ShopStats {
        let stamps = lock(&self.stamps);

        let mut served = 0;
        let mut total_wait = Duration::ZERO;
        let mut total_service = Duration::ZERO;
        for (_, wait, service) in stamps.served() {
            served += 1;
            total_wait += wait;
            total_service += service;
        }

        let mean = |total: Duration| {
            u32::try_from(served)
                .ok()
                .filter(|n| *n > 0)
                .map(|n| total / n)
        };

        ShopStats {
            avg_wait: mean(total_wait),
            avg_service: mean(total_service),
            served,
            left: stamps.balked.len(),
            waiting,
            generated: self.generated(),
        }
    }

    /// One record per arrived customer, ordered by id
    pub fn records(&self) -> Vec<CustomerRecord> {
        let stamps = lock(&self.stamps);

        let served: HashMap<CustomerId, (Duration, Duration)> = stamps
            .served()
            .map(|(id, wait, service)| (id, (wait, service)))
            .collect();

        let mut records: Vec<CustomerRecord> = stamps
            .arrivals
            .keys()
            .map(|id| match served.get(id) {
                Some((wait, service)) => CustomerRecord {
                    id: *id,
                    outcome: Outcome::Served,
                    wait_secs: Some(wait.as_secs_f64()),
                    service_secs: Some(service.as_secs_f64()),
                },
                None => CustomerRecord {
                    id: *id,
                    outcome: if stamps.balked.contains(id) {
                        Outcome::Balked
                    } else {
                        Outcome::Pending
                    },
                    wait_secs: None,
                    service_secs: None,
                },
            })
            .collect();

        records.sort_by_key(|r| r.id);
        records
    }

    /// Arrival/start/end instants for one customer
    pub fn timeline(&self, id: CustomerId) -> (Option<Instant>, Option<Instant>, Option<Instant>) {
        let stamps = lock(&self.stamps);
        (
            stamps.arrivals.get(&id).copied(),
            stamps.starts.get(&id).copied(),
            stamps.ends.get(&id).copied(),
        )
    }
}

impl ServiceObserver for Ledger {
    fn on_service_start(&self, id: CustomerId) {
        lock(&self.stamps).starts.insert(id, Instant::now());
    }

    fn on_service_end(&self, id: CustomerId) {
        lock(&self.stamps).ends.insert(id, Instant::now());
    }
}
