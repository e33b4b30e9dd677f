//! Accounting of the execution budget consumed by an insertion.
//!
//! The accumulator is designed for environments that charge for every storage access and
//! impose a ceiling on the cost of a single call. A [`Meter`] tallies the operations an
//! insertion performs against a [`CostSchedule`], so that the budget remaining after the climb
//! can be reported as an [`Event::GasLeft`](crate::Event::GasLeft) diagnostic. Metering never
//! alters the behavior of an insertion.

/// The cost charged for each kind of operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostSchedule {
    pub load: u64,
    pub store: u64,
    pub hash: u64,
}

impl Default for CostSchedule {
    fn default() -> Self {
        CostSchedule {
            load: 2_100,
            store: 20_000,
            hash: 36,
        }
    }
}

/// A running tally of the cost of a single insertion against a fixed limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Meter {
    schedule: CostSchedule,
    limit: u64,
    used: u64,
}

impl Meter {
    pub fn new(schedule: CostSchedule, limit: u64) -> Self {
        Meter {
            schedule,
            limit,
            used: 0,
        }
    }

    pub fn load(&mut self) {
        self.charge(self.schedule.load)
    }

    pub fn store(&mut self) {
        self.charge(self.schedule.store)
    }

    pub fn hash(&mut self) {
        self.charge(self.schedule.hash)
    }

    fn charge(&mut self, cost: u64) {
        self.used = self.used.saturating_add(cost);
    }

    /// Returns the total cost charged so far.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Returns the budget remaining, saturating at zero.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}
