use crate::core::particle::Particle;
use crate::error::{Error, Result};
use std::fmt;

/// Default side length of the occupancy grid.
pub const DEFAULT_GRID: usize = 32;

/// Largest accepted grid side; the occupancy vector holds `MAX_GRID²` counters.
pub const MAX_GRID: usize = 1024;

/// One spatial-entropy measurement.
///
/// - `h`: Shannon entropy of the occupancy grid, in nats
/// - `h_max`: `ln(min(N, G^2))`, the largest `h` reachable with `N` particles
/// - `normalized`: `h / h_max` clamped to `[0, 1]`, or 0 when `h_max` is 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropySample {
    pub h: f64,
    pub h_max: f64,
    pub normalized: f64,
}

impl fmt::Display for EntropySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H = {:.3} nats / Hmax = {:.3} ({:.1}%)",
            self.h,
            self.h_max,
            self.normalized * 100.0
        )
    }
}

/// Buckets particle centres into a fixed `G x G` grid over the bounding box and
/// measures how evenly they are spread.
///
/// Resolution does not adapt to the particle count.
#[derive(Debug, Clone)]
pub struct EntropyEstimator {
    grid: usize,
}

impl Default for EntropyEstimator {
    fn default() -> Self {
        Self { grid: DEFAULT_GRID }
    }
}

impl EntropyEstimator {
    /// Errors: `Error::InvalidParam` if `grid` is 0 or above [`MAX_GRID`].
    pub fn new(grid: usize) -> Result<Self> {
        if grid == 0 || grid > MAX_GRID {
            return Err(Error::InvalidParam(format!("grid size must be in 1..={MAX_GRID}")));
        }
        if grid.checked_mul(grid).is_none() {
            return Err(Error::InvalidParam("grid size overflows cell count".into()));
        }
        Ok(Self { grid })
    }

    pub fn grid(&self) -> usize {
        self.grid
    }

    /// Number of cells, `G^2`.
    pub fn cells(&self) -> usize {
        self.grid * self.grid
    }

    /// Grid cell `(column, row)` of a point.
    ///
    /// Each axis maps `floor(coord / max(extent, 1) * G)` into `[0, G - 1]`, so
    /// points on or beyond the far edge land in the last cell and degenerate
    /// extents never divide by zero.
    pub fn cell_of(&self, x: f64, y: f64, width: f64, height: f64) -> (usize, usize) {
        (self.axis_index(x, width), self.axis_index(y, height))
    }

    fn axis_index(&self, coord: f64, extent: f64) -> usize {
        let g = self.grid as f64;
        let raw = (coord / extent.max(1.0) * g).floor();
        // NaN and negatives fall into cell 0.
        if raw.is_nan() || raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.grid - 1)
        }
    }

    /// Per-cell particle counts in row-major order (`row * G + column`).
    pub fn occupancy(&self, particles: &[Particle], width: f64, height: f64) -> Vec<u32> {
        let mut counts = vec![0u32; self.cells()];
        for p in particles {
            let (cx, cy) = self.cell_of(p.r[0], p.r[1], width, height);
            counts[cy * self.grid + cx] += 1;
        }
        counts
    }

    /// Measure the spatial entropy of `particles` inside `[0, width] x [0, height]`.
    ///
    /// Returns `None` when there are no particles.
    pub fn compute(
        &self,
        particles: &[Particle],
        width: f64,
        height: f64,
    ) -> Option<EntropySample> {
        if particles.is_empty() {
            return None;
        }
        let n = particles.len() as f64;
        let h: f64 = self
            .occupancy(particles, width, height)
            .into_iter()
            .filter(|&c| c > 0)
            .map(|c| {
                let p = c as f64 / n;
                -p * p.ln()
            })
            .sum();

        let h_max = (particles.len().min(self.cells()) as f64).ln();
        let normalized = if h_max > 0.0 {
            (h / h_max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(EntropySample {
            h: h.max(0.0),
            h_max,
            normalized,
        })
    }
}
