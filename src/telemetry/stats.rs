//! # Incremental Field Statistics
//!
//! Running min/max/average for one field over a sliding window, updated in
//! `O(log n)` when a value enters or leaves the window.
//!
//! Min and max come from an ordered multiset of the live values. The average
//! uses a compensated running sum so that long insert/evict sequences do not
//! drift away from the window's true mean.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// `f64` with a total order, usable as a map key
#[derive(Debug, Clone, Copy)]
struct OrderedValue(f64);

impl PartialEq for OrderedValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrderedValue {}

impl PartialOrd for OrderedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Aggregates for the values of one field currently inside the window
#[derive(Debug, Clone, Default)]
pub struct FieldStats {
    /// Live values with their multiplicity
    values: BTreeMap<OrderedValue, usize>,
    count: usize,
    sum: f64,
    /// Neumaier compensation term for `sum`
    compensation: f64,
}

impl FieldStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value entering the window
    ///
    /// Non-finite values are ignored; one infinity would leave the running
    /// sum NaN for as long as the field stays in the window.
    pub fn insert(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        *self.values.entry(OrderedValue(value)).or_insert(0) += 1;
        self.count += 1;
        self.accumulate(value);
    }

    /// Forget a value leaving the window
    ///
    /// Returns false if the value was not in the window.
    pub fn remove(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let key = OrderedValue(value);
        match self.values.get_mut(&key) {
            Some(n) if *n > 1 => *n -= 1,
            Some(_) => {
                self.values.remove(&key);
            }
            None => return false,
        }

        self.count -= 1;
        if self.count == 0 {
            self.sum = 0.0;
            self.compensation = 0.0;
        } else {
            self.accumulate(-value);
        }
        true
    }

    /// Number of live values
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn min(&self) -> Option<f64> {
        self.values.keys().next().map(|v| v.0)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.keys().next_back().map(|v| v.0)
    }

    /// Mean of the live values, `None` when the window holds none
    pub fn avg(&self) -> Option<f64> {
        let (min, max) = (self.min()?, self.max()?);
        let mean = (self.sum + self.compensation) / self.count as f64;
        // Rounding can push the mean a hair outside the observed range
        Some(mean.clamp(min, max))
    }

    fn accumulate(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }
}
