//! Customer arrivals.

use std::sync::Arc;
use std::time::Duration;

use shop_telemetry::{EventSink, ShopEvent};

use crate::customer::{Customer, CustomerId};
use crate::ledger::Ledger;
use crate::signal::Signal;
use crate::uniform_duration;
use crate::waiting_room::WaitingRoom;
use crate::worker::Worker;

/// Produces a fixed number of customers at uniformly random intervals
pub struct ArrivalGenerator {
    room: Arc<WaitingRoom>,
    worker: Arc<Worker>,
    ledger: Arc<Ledger>,
    stop: Arc<Signal>,
    sink: Arc<dyn EventSink>,
    total: usize,
    interval: (Duration, Duration),
}

impl ArrivalGenerator {
    pub fn new(
        room: Arc<WaitingRoom>,
        worker: Arc<Worker>,
        ledger: Arc<Ledger>,
        stop: Arc<Signal>,
        sink: Arc<dyn EventSink>,
        total: usize,
        interval: (Duration, Duration),
    ) -> Self {
        Self {
            room,
            worker,
            ledger,
            stop,
            sink,
            total,
            interval,
        }
    }

    pub fn run(&self) {
        tracing::debug!(total = self.total, "arrival generator started");
        let mut rng = rand::thread_rng();

        for id in (1..).take(self.total) {
            if self.stop.is_set() {
                break;
            }

            let delay = uniform_duration(&mut rng, self.interval.0, self.interval.1);
            if self.stop.wait_timeout(delay) {
                break;
            }

            self.arrive(id);
        }

        tracing::debug!(generated = self.ledger.generated(), "arrival generator finished");
    }

    /// Seat one customer or turn it away
    fn arrive(&self, id: CustomerId) {
        let customer = Customer::new(id);
        self.ledger.record_arrival(id, customer.arrival());

        if self.room.add(customer) {
            self.sink.emit(&ShopEvent::CustomerSeated {
                id,
                waiting: self.room.len(),
            });
            // add() does not notify; a sleeping dispatcher needs the wake
            self.worker.wake();
        } else {
            self.ledger.record_balk(id);
            self.sink.emit(&ShopEvent::CustomerBalked { id });
        }

        self.ledger.record_generated();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_telemetry::{MemorySink, WorkerState};
    use std::time::Instant;

    fn generator(capacity: usize, total: usize, interval: (Duration, Duration)) -> (ArrivalGenerator, Arc<MemorySink>) {
        let ledger = Arc::new(Ledger::new());
        let sink = Arc::new(MemorySink::new());
        let worker = Arc::new(Worker::new(
            (Duration::ZERO, Duration::ZERO),
            ledger.clone(),
            sink.clone(),
        ));
        let generator = ArrivalGenerator::new(
            Arc::new(WaitingRoom::new(capacity)),
            worker,
            ledger,
            Arc::new(Signal::new()),
            sink.clone(),
            total,
            interval,
        );
        (generator, sink)
    }

    #[test]
    fn test_seats_until_full_then_balks() {
        let (generator, sink) = generator(2, 5, (Duration::ZERO, Duration::ZERO));
        generator.run();

        assert_eq!(generator.ledger.generated(), 5);
        assert_eq!(generator.ledger.left(), 3);
        assert_eq!(generator.room.snapshot(), vec![1, 2]);
        assert_eq!(sink.count(|e| matches!(e, ShopEvent::CustomerBalked { .. })), 3);
    }

    #[test]
    fn test_seating_wakes_worker() {
        let (generator, sink) = generator(1, 1, (Duration::ZERO, Duration::ZERO));
        assert_eq!(generator.worker.state(), WorkerState::Sleeping);

        generator.run();

        assert_eq!(generator.worker.state(), WorkerState::Awake);
        assert_eq!(sink.count(|e| *e == ShopEvent::WorkerWoke), 1);
    }

    #[test]
    fn test_stop_aborts_pending_wait() {
        let (generator, _) = generator(5, 3, (Duration::from_secs(30), Duration::from_secs(30)));
        let generator = Arc::new(generator);

        let handle = {
            let generator = generator.clone();
            std::thread::spawn(move || generator.run())
        };

        std::thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        generator.stop.set();
        handle.join().unwrap();

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(generator.ledger.generated(), 0);
    }
}
