use crate::config::SimConfig;
use crate::core::entropy::{EntropyEstimator, EntropySample};
use crate::core::history::{HistoryBuffer, SampleCadence};
use crate::core::particle::{Particle, DIM};
use crate::core::spawn::{SpawnHandle, Spawner};
use crate::core::system::{CollisionMode, ParticleSystem, StepReport};
use crate::core::view::{ParticleView, Tint};
use crate::error::{Error, Result};
use log::{debug, info};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use std::time::{Duration, Instant};

/// Single owner of all simulation state: particles and their tints, the entropy
/// estimator, history and its cadence, held-pointer spawn streams, surface bounds
/// and the RNG.
///
/// All mutation goes through `&mut self`, so an external event loop applies each
/// callback (step, spawn, resize) fully before the next one starts.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    bounds: [f64; DIM],
    system: ParticleSystem,
    tints: Vec<Tint>,
    estimator: EntropyEstimator,
    history: HistoryBuffer,
    cadence: SampleCadence,
    spawner: Spawner,
    rng: StdRng,
    origin: Instant,
    frames: u64,
}

impl Simulation {
    /// Create a simulation from a validated `config`, populated with
    /// `config.initial_particles` randomly placed discs.
    ///
    /// Errors: `Error::InvalidParam` from [`SimConfig::validate`].
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let mut rng: StdRng = match config.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };

        let bounds = [config.width, config.height];
        let mut system = ParticleSystem::from_config(&config)?;
        let added = system.populate(config.initial_particles, bounds, &mut rng);
        let tints = (0..added).map(|_| Tint::random(&mut rng)).collect();

        info!(
            "simulation created: {added} particles in {}x{}, grid {}, mode {:?}",
            config.width, config.height, config.grid_size, config.collision_mode
        );

        Ok(Self {
            bounds,
            system,
            tints,
            estimator: EntropyEstimator::new(config.grid_size)?,
            history: HistoryBuffer::new(config.history_capacity)?,
            cadence: SampleCadence::new(config.sample_interval()),
            spawner: Spawner::new(config.spawn_repeat(), config.spawn_burst),
            rng,
            origin: Instant::now(),
            frames: 0,
            config,
        })
    }

    /// Load a JSON config file and build a simulation from it.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(SimConfig::load(path)?)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current surface `[width, height]`.
    pub fn bounds(&self) -> [f64; DIM] {
        self.bounds
    }

    /// Update the surface size. Particles left outside are pulled back in on the
    /// next step.
    ///
    /// Errors: `Error::InvalidParam` if either dimension is not finite.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<()> {
        if !width.is_finite() || !height.is_finite() {
            return Err(Error::InvalidParam("width and height must be finite".into()));
        }
        debug!("resize {}x{} -> {width}x{height}", self.bounds[0], self.bounds[1]);
        self.bounds = [width, height];
        Ok(())
    }

    pub fn set_collision_mode(&mut self, mode: CollisionMode) {
        self.system.set_mode(mode);
    }

    /// Number of particles.
    pub fn num_particles(&self) -> usize {
        self.system.len()
    }

    pub fn particles(&self) -> &[Particle] {
        self.system.particles()
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// Particles composed with their tints for drawing.
    pub fn views(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.system
            .particles()
            .iter()
            .zip(self.tints.iter())
            .map(|(p, &t)| ParticleView::compose(p, t))
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Most recent entropy sample, if any.
    pub fn latest(&self) -> Option<&EntropySample> {
        self.history.latest()
    }

    /// Frames stepped so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total kinetic energy (diagnostic).
    pub fn kinetic_energy(&self) -> f64 {
        self.system.kinetic_energy()
    }

    /// Add `count` particles at `(x, y)` in surface coordinates. Non-positive
    /// counts do nothing. Returns how many were added after the cap.
    pub fn spawn(&mut self, x: f64, y: f64, count: i64) -> usize {
        let added = self.system.spawn(x, y, count, &mut self.rng);
        for _ in 0..added {
            self.tints.push(Tint::random(&mut self.rng));
        }
        added
    }

    /// Add an explicit particle (for scripted scenarios). Returns `false` when capped.
    pub fn insert(&mut self, p: Particle) -> bool {
        if !self.system.push(p) {
            return false;
        }
        self.tints.push(Tint::random(&mut self.rng));
        true
    }

    /// Start spawning at `(x, y)`: one burst now, then one per repeat interval until
    /// the returned handle is cancelled or dropped.
    pub fn begin_spawn(&mut self, x: f64, y: f64, now: Duration) -> SpawnHandle {
        let handle = self.spawner.start(x, y, now);
        debug!("spawn stream {} started at ({x}, {y})", handle.id());
        self.tick_spawners(now);
        handle
    }

    /// Move a held spawn to follow the pointer. Returns `false` if the stream ended.
    pub fn move_spawn(&mut self, handle: &SpawnHandle, x: f64, y: f64) -> bool {
        self.spawner.retarget(handle, x, y)
    }

    /// Number of spawn streams still running.
    pub fn active_spawners(&self) -> usize {
        self.spawner.active()
    }

    /// Fire every spawn burst due at `now`. Returns particles added.
    pub fn tick_spawners(&mut self, now: Duration) -> usize {
        let mut added = 0;
        for burst in self.spawner.due(now) {
            let count = i64::try_from(burst.count).unwrap_or(i64::MAX);
            added += self.spawn(burst.point[0], burst.point[1], count);
        }
        added
    }

    /// Advance one frame at time `now` (a monotonic offset from any fixed origin).
    ///
    /// Order: due spawn bursts, one physics step over every particle, then an
    /// entropy sample of the post-step positions if the sampling interval has
    /// elapsed. Returns the new sample when one was taken.
    pub fn step(&mut self, now: Duration) -> Option<EntropySample> {
        self.tick_spawners(now);
        let StepReport {
            wall_hits,
            contacts,
        } = self.system.step(self.bounds[0], self.bounds[1]);
        self.frames += 1;
        if self.frames % 600 == 0 {
            debug!(
                "frame {}: n={} walls={wall_hits} contacts={contacts} ke={:.3}",
                self.frames,
                self.system.len(),
                self.system.kinetic_energy()
            );
        }

        if !self.cadence.ready(now) {
            return None;
        }
        let sample = self.record_sample()?;
        self.cadence.mark(now);
        Some(sample)
    }

    /// [`Simulation::step`] driven by the wall clock since construction.
    pub fn step_realtime(&mut self) -> Option<EntropySample> {
        let now = self.origin.elapsed();
        self.step(now)
    }

    /// Wall-clock offset used by [`Simulation::step_realtime`], for callers that
    /// need to pass the same clock to [`Simulation::begin_spawn`].
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Measure entropy and push it to the history. Callers mark the cadence.
    /// Returns `None` without touching history when there are no particles.
    fn record_sample(&mut self) -> Option<EntropySample> {
        let sample =
            self.estimator
                .compute(self.system.particles(), self.bounds[0], self.bounds[1])?;
        self.history.push(sample);
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(initial: usize) -> SimConfig {
        SimConfig {
            width: 200.0,
            height: 200.0,
            initial_particles: initial,
            seed: Some(1234),
            ..SimConfig::default()
        }
    }

    #[test]
    fn make_small_sim_ok() -> Result<()> {
        let mut sim = Simulation::new(small(20))?;
        assert_eq!(sim.num_particles(), 20);
        assert_eq!(sim.views().count(), 20);
        assert!(sim.kinetic_energy().is_finite());
        let s = sim.step(Duration::ZERO).expect("first step samples");
        assert!((0.0..=1.0).contains(&s.normalized));
        Ok(())
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = SimConfig {
            history_capacity: 0,
            ..small(1)
        };
        assert!(Simulation::new(cfg).is_err());
    }

    #[test]
    fn empty_sim_takes_no_sample() -> Result<()> {
        let mut sim = Simulation::new(small(0))?;
        assert!(sim.step(Duration::ZERO).is_none());
        assert!(sim.history().is_empty());
        // Cadence was not consumed: the first real sample is immediate.
        sim.spawn(50.0, 50.0, 1);
        assert!(sim.step(Duration::from_millis(1)).is_some());
        Ok(())
    }

    #[test]
    fn same_seed_same_trajectory() -> Result<()> {
        let mut a = Simulation::new(small(30))?;
        let mut b = Simulation::new(small(30))?;
        for f in 0..50u64 {
            let now = Duration::from_millis(f * 16);
            a.step(now);
            b.step(now);
        }
        assert_eq!(a.particles(), b.particles());
        Ok(())
    }

    #[test]
    fn samples_never_closer_than_interval() -> Result<()> {
        let mut sim = Simulation::new(small(10))?;
        let mut taken = Vec::new();
        for f in 0..120u64 {
            let now = Duration::from_millis(f * 16);
            match f % 4 {
                0 => {
                    sim.spawn(100.0, 100.0, 1);
                }
                1 => sim.resize(200.0 + f as f64, 200.0)?,
                2 => drop(sim.begin_spawn(50.0, 50.0, now)),
                _ => {}
            }
            if sim.step(now).is_some() {
                taken.push(now);
            }
        }
        assert_eq!(sim.history().len(), taken.len());
        for w in taken.windows(2) {
            assert!(w[1] - w[0] >= Duration::from_millis(100), "{:?}", w);
        }
        Ok(())
    }

    #[test]
    fn resize_rejects_nan() -> Result<()> {
        let mut sim = Simulation::new(small(1))?;
        assert!(sim.resize(f64::NAN, 10.0).is_err());
        sim.resize(50.0, 60.0)?;
        assert_eq!(sim.bounds(), [50.0, 60.0]);
        Ok(())
    }
}
