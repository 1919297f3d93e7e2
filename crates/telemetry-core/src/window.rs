//! Rolling window of recent readings
//!
//! This module provides a bounded FIFO buffer for the readings shown on charts
//! and used for short-window analytics:
//! - Fixed capacity with oldest-first eviction
//! - Arrival order, which equals chronological order for a monotonic source
//! - Snapshots that are isolated from later appends

use crate::models::Reading;
use std::collections::VecDeque;

const SECS_PER_HOUR: f64 = 3600.0;

/// Bounded ring buffer of readings
#[derive(Debug, Clone)]
pub struct ReadingWindow {
    buffer: VecDeque<Reading>,
    capacity: usize,
}

impl ReadingWindow {
    /// Create a window holding at most `capacity` readings
    ///
    /// A capacity of zero is raised to one so the latest reading is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest when at capacity
    pub fn append(&mut self, reading: Reading) {
        while self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(reading);
    }

    /// Append a batch, keeping only what fits
    pub fn extend<I: IntoIterator<Item = Reading>>(&mut self, readings: I) {
        for reading in readings {
            self.append(reading);
        }
    }

    /// Copy of the window contents, most recent last
    pub fn snapshot(&self) -> Vec<Reading> {
        self.buffer.iter().copied().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.buffer.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Pair every reading with the hours it covers
///
/// A reading covers the time since its predecessor. The first reading has no
/// predecessor and is credited `nominal_secs`.
pub fn with_elapsed_hours(
    readings: &[Reading],
    nominal_secs: f64,
) -> impl Iterator<Item = (&Reading, f64)> + '_ {
    let nominal_hours = nominal_secs / SECS_PER_HOUR;
    readings.iter().enumerate().map(move |(i, reading)| {
        let hours = match i.checked_sub(1).map(|p| &readings[p]) {
            Some(prev) => {
                let millis = (reading.timestamp - prev.timestamp).num_milliseconds();
                millis.max(0) as f64 / 1000.0 / SECS_PER_HOUR
            }
            None => nominal_hours,
        };
        (reading, hours)
    })
}
