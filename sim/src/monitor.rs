//! Termination detection.

use std::sync::Arc;
use std::time::Duration;

use shop_telemetry::{EventSink, ShopEvent};

use crate::ledger::Ledger;
use crate::signal::Signal;
use crate::waiting_room::WaitingRoom;
use crate::worker::Worker;

/// Polls until every customer has been generated and nobody is waiting or in
/// the chair, then raises `done`.
pub struct CompletionMonitor {
    ledger: Arc<Ledger>,
    room: Arc<WaitingRoom>,
    worker: Arc<Worker>,
    stop: Arc<Signal>,
    done: Arc<Signal>,
    sink: Arc<dyn EventSink>,
    total: usize,
    poll_interval: Duration,
}

impl CompletionMonitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<Ledger>,
        room: Arc<WaitingRoom>,
        worker: Arc<Worker>,
        stop: Arc<Signal>,
        done: Arc<Signal>,
        sink: Arc<dyn EventSink>,
        total: usize,
        poll_interval: Duration,
    ) -> Self {
        Self {
            ledger,
            room,
            worker,
            stop,
            done,
            sink,
            total,
            poll_interval,
        }
    }

    /// One observation.
    ///
    /// The generated count is monotonic and read first, so a true result is
    /// never premature; a stale false only costs one more poll.
    pub fn is_complete(&self) -> bool {
        self.ledger.generated() >= self.total
            && self.room.is_empty()
            && self.worker.current_customer().is_none()
    }

    pub fn run(&self) {
        loop {
            if self.stop.is_set() {
                return;
            }

            if self.is_complete() {
                self.done.set();
                self.sink.emit(&ShopEvent::AllCustomersHandled);
                return;
            }

            if self.stop.wait_timeout(self.poll_interval) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::Customer;
    use shop_telemetry::NullSink;

    struct Fixture {
        ledger: Arc<Ledger>,
        room: Arc<WaitingRoom>,
        worker: Arc<Worker>,
        monitor: CompletionMonitor,
    }

    fn fixture(total: usize) -> Fixture {
        let ledger = Arc::new(Ledger::new());
        let room = Arc::new(WaitingRoom::new(2));
        let worker = Arc::new(Worker::new(
            (Duration::ZERO, Duration::ZERO),
            ledger.clone(),
            Arc::new(NullSink),
        ));
        let monitor = CompletionMonitor::new(
            ledger.clone(),
            room.clone(),
            worker.clone(),
            Arc::new(Signal::new()),
            Arc::new(Signal::new()),
            Arc::new(NullSink),
            total,
            Duration::from_millis(10),
        );
        Fixture {
            ledger,
            room,
            worker,
            monitor,
        }
    }

    #[test]
    fn test_not_complete_until_all_generated() {
        let f = fixture(2);
        assert!(!f.monitor.is_complete());

        f.ledger.record_generated();
        assert!(!f.monitor.is_complete());

        f.ledger.record_generated();
        assert!(f.monitor.is_complete());
    }

    #[test]
    fn test_not_complete_while_customers_remain() {
        let f = fixture(1);
        f.ledger.record_generated();
        assert!(f.room.add(Customer::new(1)));
        assert!(!f.monitor.is_complete());

        // In the chair
        assert_eq!(f.worker.claim_next(&f.room), Some(1));
        assert!(!f.monitor.is_complete());

        assert_eq!(f.worker.service(), Some(1));
        assert!(f.monitor.is_complete());
    }

    #[test]
    fn test_run_raises_done() {
        let f = fixture(1);
        f.ledger.record_generated();

        f.monitor.run();
        assert!(f.monitor.done.is_set());
    }

    #[test]
    fn test_run_exits_on_stop() {
        let f = fixture(1);
        f.monitor.stop.set();

        f.monitor.run();
        assert!(!f.monitor.done.is_set());
    }
}
