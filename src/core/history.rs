use crate::core::entropy::EntropySample;
use crate::error::{Error, Result};
use std::collections::vec_deque::{self, VecDeque};
use std::time::Duration;

/// Default number of retained samples: 60 s at 10 Hz.
pub const DEFAULT_CAPACITY: usize = 600;

/// Default minimum gap between samples.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed-capacity FIFO of entropy samples, oldest first.
///
/// Pushing into a full buffer evicts the oldest sample, so `len() <= capacity()`
/// always holds.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<EntropySample>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self {
            samples: VecDeque::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl HistoryBuffer {
    /// Errors: `Error::InvalidParam` if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidParam("history capacity must be > 0".into()));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a sample, evicting the oldest when full. Returns the evicted sample.
    pub fn push(&mut self, sample: EntropySample) -> Option<EntropySample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Most recent sample, for textual display.
    pub fn latest(&self) -> Option<&EntropySample> {
        self.samples.back()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, EntropySample> {
        self.samples.iter()
    }

    /// The `normalized` series, oldest first, for plotting.
    pub fn normalized_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.normalized).collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<'a> IntoIterator for &'a HistoryBuffer {
    type Item = &'a EntropySample;
    type IntoIter = vec_deque::Iter<'a, EntropySample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Wall-clock throttle for sampling, independent of how often frames run.
///
/// Times are monotonic offsets from an arbitrary origin chosen by the caller.
#[derive(Debug, Clone)]
pub struct SampleCadence {
    interval: Duration,
    last: Option<Duration>,
}

impl Default for SampleCadence {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl SampleCadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time of the last recorded sample.
    pub fn last(&self) -> Option<Duration> {
        self.last
    }

    /// True if nothing has been sampled yet or at least `interval` has passed
    /// since the last sample. A clock that runs backwards is never ready.
    pub fn ready(&self, now: Duration) -> bool {
        match self.last {
            None => true,
            Some(last) => now
                .checked_sub(last)
                .is_some_and(|elapsed| elapsed >= self.interval),
        }
    }

    /// Record that a sample was taken at `now`.
    pub fn mark(&mut self, now: Duration) {
        self.last = Some(now);
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
