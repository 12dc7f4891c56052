//! Bounded FIFO waiting room.
//!
//! Every operation takes the single room guard for its whole duration and
//! nothing ever blocks while holding it.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::customer::{Customer, CustomerId};
use crate::lock;

#[derive(Debug)]
pub struct WaitingRoom {
    capacity: usize,
    customers: Mutex<VecDeque<Customer>>,
}

impl WaitingRoom {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            customers: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Seat a customer at the tail.
    ///
    /// Returns false (and drops the customer) when every chair is taken.
    pub fn add(&self, customer: Customer) -> bool {
        let mut customers = lock(&self.customers);
        if customers.len() >= self.capacity {
            return false;
        }
        customers.push_back(customer);
        true
    }

    /// Remove the customer at the head, if any
    pub fn take_next(&self) -> Option<Customer> {
        lock(&self.customers).pop_front()
    }

    pub fn len(&self) -> usize {
        lock(&self.customers).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.customers).is_empty()
    }

    pub fn is_full(&self) -> bool {
        lock(&self.customers).len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ids of the seated customers, head first
    pub fn snapshot(&self) -> Vec<CustomerId> {
        lock(&self.customers).iter().map(Customer::id).collect()
    }
}
