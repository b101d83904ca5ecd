use crate::config::SimConfig;
use crate::core::particle::{contact, Contact, Particle, DIM};
use crate::error::{Error, Result};
use log::{debug, trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// How pairwise overlaps are resolved within one step.
///
/// - `Sequential`: particles are processed one at a time in container order and
///   each resolution mutates both discs immediately, so later particles see the
///   already-corrected state of earlier ones. A pair can be visited from both
///   sides in the same step.
/// - `Snapshot`: every overlapping pair is resolved against the state left by the
///   wall pass and all corrections are applied together afterwards. Each disc
///   exchanges velocity with at most one closing neighbour per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    #[default]
    Sequential,
    Snapshot,
}

/// Counters gathered during one [`ParticleSystem::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub wall_hits: usize,
    pub contacts: usize,
}

/// Insertion-ordered collection of discs sharing one radius.
///
/// Order is irrelevant to the physics model but determines processing order in
/// [`CollisionMode::Sequential`].
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    radius: f64,
    mode: CollisionMode,
    max_particles: Option<usize>,
    fast_speed: (f64, f64),
    spawn_speed: f64,
}

impl ParticleSystem {
    /// Create an empty system of discs with the given `radius`.
    ///
    /// Errors: `Error::InvalidParam` if `radius` is not finite and > 0.
    pub fn new(radius: f64, mode: CollisionMode) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        Ok(Self {
            particles: Vec::new(),
            radius,
            mode,
            max_particles: None,
            fast_speed: (2.0, 4.0),
            spawn_speed: 1.0,
        })
    }

    /// Build an empty system from the physics-related fields of `cfg`.
    pub fn from_config(cfg: &SimConfig) -> Result<Self> {
        Self::new(cfg.radius, cfg.collision_mode)?
            .with_max_particles(cfg.max_particles)
            .with_speeds(cfg.fast_speed, cfg.spawn_speed)
    }

    pub fn with_max_particles(mut self, cap: Option<usize>) -> Self {
        self.max_particles = cap;
        self
    }

    /// Set the speed range for randomly placed particles and the per-component
    /// bound for spawned ones.
    ///
    /// Errors: `Error::InvalidParam` unless `0 <= fast.0 <= fast.1` and
    /// `spawn >= 0`, all finite.
    pub fn with_speeds(mut self, fast: (f64, f64), spawn: f64) -> Result<Self> {
        validate_speeds(fast, spawn)?;
        self.fast_speed = fast;
        self.spawn_speed = spawn;
        Ok(self)
    }

    pub fn mode(&self) -> CollisionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CollisionMode) {
        self.mode = mode;
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn max_particles(&self) -> Option<usize> {
        self.max_particles
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of particles that may still be added before the cap is hit.
    fn room(&self, requested: usize) -> usize {
        match self.max_particles {
            Some(cap) => requested.min(cap.saturating_sub(self.particles.len())),
            None => requested,
        }
    }

    /// Append an explicit particle. Returns `false` if the cap is reached.
    pub fn push(&mut self, p: Particle) -> bool {
        if self.room(1) == 0 {
            return false;
        }
        self.particles.push(p);
        true
    }

    /// Append `count` particles at uniformly random positions inside `bounds`, each
    /// moving in a random direction with a speed drawn from the fast range.
    ///
    /// Returns the number actually added (fewer than `count` when capped).
    pub fn populate<R: Rng>(&mut self, count: usize, bounds: [f64; DIM], rng: &mut R) -> usize {
        let n = self.room(count);
        let (lo_speed, hi_speed) = self.fast_speed;
        self.particles.reserve(n);
        for _ in 0..n {
            let mut r = [0.0_f64; DIM];
            for (rk, &extent) in r.iter_mut().zip(bounds.iter()) {
                let lo = self.radius;
                let hi = (extent - self.radius).max(lo);
                *rk = rng.random_range(lo..=hi);
            }
            let speed = rng.random_range(lo_speed..=hi_speed);
            let theta = rng.random_range(0.0..TAU);
            let (s, c) = theta.sin_cos();
            self.particles.push(Particle {
                r,
                v: [speed * c, speed * s],
                radius: self.radius,
            });
        }
        if n < count {
            debug!("populate capped: requested {count}, added {n}");
        }
        n
    }

    /// Append `count` particles at `(x, y)` with each velocity component uniform in
    /// `[-spawn_speed, spawn_speed]`.
    ///
    /// Non-positive `count` and non-finite points are ignored. Returns the number
    /// actually added.
    pub fn spawn<R: Rng>(&mut self, x: f64, y: f64, count: i64, rng: &mut R) -> usize {
        if count <= 0 {
            return 0;
        }
        if !x.is_finite() || !y.is_finite() {
            warn!("ignoring spawn at non-finite point ({x}, {y})");
            return 0;
        }
        let requested = usize::try_from(count).unwrap_or(usize::MAX);
        let n = self.room(requested);
        let s = self.spawn_speed;
        for _ in 0..n {
            let v = [rng.random_range(-s..=s), rng.random_range(-s..=s)];
            self.particles.push(Particle {
                r: [x, y],
                v,
                radius: self.radius,
            });
        }
        if n < requested {
            debug!(
                "spawn capped at {:?}: requested {requested}, added {n}",
                self.max_particles
            );
        }
        n
    }

    /// Advance every particle by one unit step inside the box `[0, width] x [0, height]`.
    ///
    /// Each particle bounces off the walls, resolves overlaps with every other
    /// particle, integrates its position, and is confined to the box again. After
    /// this returns every centre lies within `[radius, extent - radius]` per axis.
    pub fn step(&mut self, width: f64, height: f64) -> StepReport {
        let bounds = [width, height];
        let report = match self.mode {
            CollisionMode::Sequential => self.step_sequential(bounds),
            CollisionMode::Snapshot => self.step_snapshot(bounds),
        };
        trace!(
            "step n={} walls={} contacts={}",
            self.particles.len(),
            report.wall_hits,
            report.contacts
        );
        report
    }

    fn step_sequential(&mut self, bounds: [f64; DIM]) -> StepReport {
        let mut report = StepReport::default();
        let n = self.particles.len();
        for i in 0..n {
            if self.particles[i].bounce_walls(bounds) {
                report.wall_hits += 1;
            }
            for j in 0..n {
                if j == i {
                    continue;
                }
                let (a, b) = pair_mut(&mut self.particles, i, j);
                if a.collide(b) {
                    report.contacts += 1;
                }
            }
            let p = &mut self.particles[i];
            p.advance();
            if p.bounce_walls(bounds) {
                report.wall_hits += 1;
            }
        }
        // Earlier particles may have been pushed out by a later neighbour's separation.
        for p in &mut self.particles {
            if p.bounce_walls(bounds) {
                report.wall_hits += 1;
            }
        }
        report
    }

    fn step_snapshot(&mut self, bounds: [f64; DIM]) -> StepReport {
        let mut report = StepReport::default();
        for p in &mut self.particles {
            if p.bounce_walls(bounds) {
                report.wall_hits += 1;
            }
        }

        let n = self.particles.len();
        let mut contacts: Vec<(usize, usize, Contact)> = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(c) = contact(&self.particles[i], &self.particles[j]) {
                    contacts.push((i, j, c));
                }
            }
        }
        report.contacts = contacts.len();

        // Every overlapping pair is pushed apart; separations add up.
        let mut dr = vec![[0.0_f64; DIM]; n];
        for &(i, j, c) in &contacts {
            for k in 0..DIM {
                dr[i][k] -= c.shift[k];
                dr[j][k] += c.shift[k];
            }
        }

        // Velocities: each disc takes part in at most one exchange per step,
        // deepest closing contact first, so every exchange starts from the
        // snapshot velocities and conserves the pair's energy and momentum.
        contacts.sort_by(|a, b| b.2.overlap.total_cmp(&a.2.overlap));
        let mut exchanged = vec![false; n];
        for &(i, j, c) in &contacts {
            if !c.approaching || exchanged[i] || exchanged[j] {
                continue;
            }
            exchanged[i] = true;
            exchanged[j] = true;
            self.particles[i].v = c.va;
            self.particles[j].v = c.vb;
        }

        for (p, dri) in self.particles.iter_mut().zip(&dr) {
            for k in 0..DIM {
                p.r[k] += dri[k];
            }
            p.advance();
            if p.bounce_walls(bounds) {
                report.wall_hits += 1;
            }
        }
        report
    }

    /// Total kinetic energy (diagnostic; unit masses).
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Total linear momentum (diagnostic; unit masses).
    pub fn momentum(&self) -> [f64; DIM] {
        let mut p = [0.0_f64; DIM];
        for q in &self.particles {
            for (pk, vk) in p.iter_mut().zip(q.v.iter()) {
                *pk += vk;
            }
        }
        p
    }
}

/// Shared range check for the fast speed range and the spawn speed bound.
pub(crate) fn validate_speeds(fast: (f64, f64), spawn: f64) -> Result<()> {
    let (lo, hi) = fast;
    if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || hi < lo {
        return Err(Error::InvalidParam("fast_speed must satisfy 0 <= min <= max".into()));
    }
    if !spawn.is_finite() || spawn < 0.0 {
        return Err(Error::InvalidParam("spawn_speed must be finite and >= 0".into()));
    }
    Ok(())
}

/// Borrow particles `i` and `j` (distinct) mutably at the same time, in that order.
fn pair_mut(ps: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = ps.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = ps.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
