//! Repeating spawn requests while a pointer is held down.
//!
//! Each held pointer becomes a stream that emits one burst per repeat interval.
//! The caller owns a [`SpawnHandle`]; cancelling it (or dropping it) stops the
//! stream, and the controller prunes stopped streams on its next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Revocable handle to a running spawn stream.
///
/// `cancel` is idempotent. Dropping the handle cancels the stream too.
#[derive(Debug)]
pub struct SpawnHandle {
    id: u64,
    live: Arc<AtomicBool>,
}

impl SpawnHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl Drop for SpawnHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug)]
struct SpawnStream {
    id: u64,
    live: Arc<AtomicBool>,
    point: [f64; 2],
    next_due: Duration,
}

/// A burst that became due: `count` particles at `point`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub point: [f64; 2],
    pub count: usize,
}

/// Schedules bursts for every live spawn stream.
#[derive(Debug)]
pub struct Spawner {
    streams: Vec<SpawnStream>,
    next_id: u64,
    repeat: Duration,
    burst: usize,
}

impl Spawner {
    pub fn new(repeat: Duration, burst: usize) -> Self {
        Self {
            streams: Vec::new(),
            next_id: 0,
            repeat,
            burst,
        }
    }

    /// Start a stream at `(x, y)` whose first burst is due at `now`.
    pub fn start(&mut self, x: f64, y: f64, now: Duration) -> SpawnHandle {
        let id = self.next_id;
        self.next_id += 1;
        let live = Arc::new(AtomicBool::new(true));
        self.streams.push(SpawnStream {
            id,
            live: Arc::clone(&live),
            point: [x, y],
            next_due: now,
        });
        SpawnHandle { id, live }
    }

    /// Move a live stream to a new point. Returns `false` if it is no longer running.
    pub fn retarget(&mut self, handle: &SpawnHandle, x: f64, y: f64) -> bool {
        if !handle.is_active() {
            return false;
        }
        match self.streams.iter_mut().find(|s| s.id == handle.id) {
            Some(s) => {
                s.point = [x, y];
                true
            }
            None => false,
        }
    }

    /// Drop cancelled streams and collect the bursts due at `now`.
    ///
    /// A stream emits at most one burst per call; if the caller stalled past
    /// several intervals the missed bursts are skipped, not replayed.
    pub fn due(&mut self, now: Duration) -> Vec<Burst> {
        self.streams.retain(|s| s.live.load(Ordering::Acquire));
        let mut out = Vec::new();
        for s in &mut self.streams {
            if now < s.next_due {
                continue;
            }
            out.push(Burst {
                point: s.point,
                count: self.burst,
            });
            s.next_due += self.repeat;
            if s.next_due <= now {
                s.next_due = now + self.repeat;
            }
        }
        out
    }

    /// Number of streams not yet pruned. Cancelled streams count until the next `due`.
    pub fn active(&self) -> usize {
        self.streams
            .iter()
            .filter(|s| s.live.load(Ordering::Acquire))
            .count()
    }
}
