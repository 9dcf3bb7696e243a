//! Per-hop-class sentence quotas.
//!
//! Gating is check-then-act at query granularity: a query is only issued
//! while its class is below target, and every sentence it yields is counted.
//! To keep that overshoot bound when several workers query at once, each
//! query first takes a [`QuotaReservation`] for its worst-case yield. A new
//! reservation is granted only while `count + reserved < target`; otherwise
//! the caller waits for in-flight queries to settle, or gets `None` once the
//! class is closed. The last query to open therefore saw every earlier
//! sentence (counted or reserved) below target, so the final count stays
//! under `target + worst_case`.

use parking_lot::{Condvar, Mutex};

use crate::models::{HopClass, HopTable};

#[derive(Debug, Default, Clone, Copy)]
struct ClassState {
    count: u64,
    reserved: u64,
}

#[derive(Debug)]
pub struct QuotaTracker {
    targets: HopTable<u64>,
    state: Mutex<HopTable<ClassState>>,
    settled: Condvar,
}

/// Worst-case yield of one in-flight query, held against its class until
/// [`commit`](QuotaReservation::commit)ted or dropped.
#[derive(Debug)]
#[must_use = "an uncommitted reservation is released with zero sentences"]
pub struct QuotaReservation<'a> {
    tracker: &'a QuotaTracker,
    hop: HopClass,
    worst_case: u64,
    released: bool,
}

impl QuotaReservation<'_> {
    pub fn hop(&self) -> HopClass {
        self.hop
    }

    /// Count `produced` sentences and release the reservation; returns the
    /// new count for the class.
    pub fn commit(mut self, produced: u64) -> u64 {
        self.release(produced)
    }

    fn release(&mut self, produced: u64) -> u64 {
        self.released = true;
        let mut state = self.tracker.state.lock();
        let class = state.get_mut(self.hop);
        class.reserved -= self.worst_case;
        class.count += produced;
        let count = class.count;
        drop(state);
        self.tracker.settled.notify_all();
        count
    }
}

impl Drop for QuotaReservation<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.release(0);
        }
    }
}

impl QuotaTracker {
    pub fn new(targets: HopTable<u64>) -> Self {
        Self {
            targets,
            state: Mutex::new(HopTable::default()),
            settled: Condvar::new(),
        }
    }

    /// True while the class is still below its target.
    pub fn is_open(&self, hop: HopClass) -> bool {
        self.count(hop) < self.targets[hop]
    }

    /// Reserve room for a query on `hop` yielding at most `worst_case`
    /// sentences. Blocks while in-flight reservations could push the class
    /// past its target; returns `None` once the class is closed.
    pub fn reserve(&self, hop: HopClass, worst_case: u64) -> Option<QuotaReservation<'_>> {
        let worst_case = worst_case.max(1);
        let target = self.targets[hop];
        let mut state = self.state.lock();
        loop {
            let class = state.get_mut(hop);
            if class.count >= target {
                return None;
            }
            if class.count + class.reserved < target {
                class.reserved += worst_case;
                return Some(QuotaReservation {
                    tracker: self,
                    hop,
                    worst_case,
                    released: false,
                });
            }
            self.settled.wait(&mut state);
        }
    }

    /// Add `n` sentences to `hop` without a reservation; returns the new
    /// count.
    pub fn record(&self, hop: HopClass, n: u64) -> u64 {
        let mut state = self.state.lock();
        let class = state.get_mut(hop);
        class.count += n;
        let count = class.count;
        drop(state);
        self.settled.notify_all();
        count
    }

    pub fn all_satisfied(&self) -> bool {
        let state = self.state.lock();
        HopClass::ALL
            .iter()
            .all(|hop| state[*hop].count >= self.targets[*hop])
    }

    pub fn count(&self, hop: HopClass) -> u64 {
        self.state.lock()[hop].count
    }

    pub fn target(&self, hop: HopClass) -> u64 {
        self.targets[hop]
    }

    pub fn targets(&self) -> HopTable<u64> {
        self.targets
    }

    pub fn snapshot(&self) -> HopTable<u64> {
        self.state.lock().map(|_, class| class.count)
    }

    pub fn total(&self) -> u64 {
        self.snapshot().iter().map(|(_, n)| *n).sum()
    }
}
