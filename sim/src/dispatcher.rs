//! Dispatcher loop: pairs the idle worker with the next waiting customer.
//!
//! All service happens on this one thread, so at most one customer is ever
//! in service.

use std::sync::Arc;
use std::time::Duration;

use crate::signal::Signal;
use crate::waiting_room::WaitingRoom;
use crate::worker::Worker;

pub struct Dispatcher {
    worker: Arc<Worker>,
    room: Arc<WaitingRoom>,
    stop: Arc<Signal>,
    idle_wait: Duration,
}

impl Dispatcher {
    pub fn new(worker: Arc<Worker>, room: Arc<WaitingRoom>, stop: Arc<Signal>, idle_wait: Duration) -> Self {
        Self {
            worker,
            room,
            stop,
            idle_wait,
        }
    }

    /// Run until the stop signal is raised. An in-progress service always
    /// completes first.
    pub fn run(&self) {
        tracing::debug!("dispatcher started");

        while !self.stop.is_set() {
            let ticket = self.worker.wake_ticket();

            match self.worker.claim_next(&self.room) {
                Some(_) => {
                    self.worker.service();
                }
                None => {
                    self.worker.sleep();
                    // Bounded so the stop signal is re-checked without a notify
                    self.worker.wait_for_wake(ticket, self.idle_wait, &self.stop);
                }
            }
        }

        tracing::debug!("dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::{Customer, CustomerId};
    use crate::worker::ServiceObserver;
    use shop_telemetry::{NullSink, WorkerState};
    use std::sync::Mutex;
    use std::thread;
    use std::time::Instant;

    #[derive(Default)]
    struct Order {
        calls: Mutex<Vec<(bool, CustomerId)>>,
    }

    impl Order {
        fn ends(&self) -> usize {
            self.calls.lock().unwrap().iter().filter(|(start, _)| !start).count()
        }
    }

    impl ServiceObserver for Order {
        fn on_service_start(&self, id: CustomerId) {
            self.calls.lock().unwrap().push((true, id));
        }

        fn on_service_end(&self, id: CustomerId) {
            self.calls.lock().unwrap().push((false, id));
        }
    }

    fn wait_for(deadline: Duration, cond: impl Fn() -> bool) -> bool {
        let until = Instant::now() + deadline;
        while Instant::now() < until {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn test_serves_in_fifo_order_one_at_a_time() {
        let order = Arc::new(Order::default());
        let cut = Duration::from_millis(10);
        let worker = Arc::new(Worker::new((cut, cut), order.clone(), Arc::new(NullSink)));
        let room = Arc::new(WaitingRoom::new(3));
        let stop = Arc::new(Signal::new());

        for id in 1..=3 {
            assert!(room.add(Customer::new(id)));
        }

        let dispatcher = Dispatcher::new(worker.clone(), room.clone(), stop.clone(), Duration::from_secs(1));
        let handle = thread::spawn(move || dispatcher.run());

        assert!(wait_for(Duration::from_secs(2), || order.ends() == 3));
        stop.set();
        worker.interrupt();
        handle.join().unwrap();

        let calls = order.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(true, 1), (false, 1), (true, 2), (false, 2), (true, 3), (false, 3)]
        );
    }

    #[test]
    fn test_sleeps_when_idle_and_wakes_on_arrival() {
        let order = Arc::new(Order::default());
        let worker = Arc::new(Worker::new(
            (Duration::ZERO, Duration::ZERO),
            order.clone(),
            Arc::new(NullSink),
        ));
        let room = Arc::new(WaitingRoom::new(1));
        let stop = Arc::new(Signal::new());

        // Long idle wait: only an explicit wake can get the customer served quickly
        let dispatcher = Dispatcher::new(worker.clone(), room.clone(), stop.clone(), Duration::from_secs(30));
        let handle = thread::spawn(move || dispatcher.run());

        thread::sleep(Duration::from_millis(50));
        assert_eq!(worker.state(), WorkerState::Sleeping);

        assert!(room.add(Customer::new(1)));
        worker.wake();

        assert!(wait_for(Duration::from_secs(2), || order.ends() == 1));

        let start = Instant::now();
        stop.set();
        worker.interrupt();
        handle.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
