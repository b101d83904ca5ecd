//! Simulation core: disc physics, spatial entropy, and the sampled history.
//!
//! Leaf-first: [`particle`] → [`system`] → [`entropy`] / [`history`] →
//! [`spawn`] / [`view`] → [`sim`], the controller that owns them all.

pub mod entropy;
pub mod history;
pub mod particle;
pub mod sim;
pub mod spawn;
pub mod system;
pub mod view;

pub use entropy::{EntropyEstimator, EntropySample};
pub use history::{HistoryBuffer, SampleCadence};
pub use particle::Particle;
pub use sim::Simulation;
pub use spawn::SpawnHandle;
pub use system::{CollisionMode, ParticleSystem, StepReport};
pub use view::{ParticleView, Tint};
