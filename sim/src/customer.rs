use std::time::Instant;

pub type CustomerId = u64;

/// Arriving customer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    arrival: Instant,
}

impl Customer {
    /// Create a customer arriving now
    pub fn new(id: CustomerId) -> Self {
        Self::arriving_at(id, Instant::now())
    }

    pub fn arriving_at(id: CustomerId, arrival: Instant) -> Self {
        Self { id, arrival }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn arrival(&self) -> Instant {
        self.arrival
    }
}
