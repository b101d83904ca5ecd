use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::config::SimConfig;
use crate::core::particle::DIM;
use crate::core::{Simulation, SpawnHandle};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

type SampleTuple = (f64, f64, f64);

/// DiscGas: Python-facing wrapper around the Rust Simulation core for an
/// external renderer.
///
/// The renderer calls `step()` once per display refresh, forwards pointer
/// events to `press` / `move_pointer` / `release`, and draws from
/// `get_positions`, `get_colors` and `get_history`.
#[pyclass]
pub struct DiscGas {
    sim: Simulation,
    holds: HashMap<u64, SpawnHandle>,
}

#[pymethods]
impl DiscGas {
    /// Create a simulation on a `width` x `height` surface.
    ///
    /// Errors: raises ValueError on invalid parameters.
    #[new]
    #[pyo3(signature = (width=800.0, height=600.0, initial_particles=200, radius=4.0, seed=None))]
    fn new(
        width: f64,
        height: f64,
        initial_particles: usize,
        radius: f64,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let config = SimConfig {
            width,
            height,
            initial_particles,
            radius,
            seed,
            ..SimConfig::default()
        };
        let sim = Simulation::new(config).map_err(py_err)?;
        Ok(Self {
            sim,
            holds: HashMap::new(),
        })
    }

    /// Create a simulation from a JSON config file.
    #[staticmethod]
    fn from_config(path: &str) -> PyResult<Self> {
        let sim = Simulation::from_config_file(path).map_err(py_err)?;
        Ok(Self {
            sim,
            holds: HashMap::new(),
        })
    }

    /// Update the surface size after a canvas resize.
    fn resize(&mut self, width: f64, height: f64) -> PyResult<()> {
        self.sim.resize(width, height).map_err(py_err)
    }

    /// Add `count` particles at (x, y). Returns how many were added.
    #[pyo3(signature = (x, y, count=1))]
    fn spawn(&mut self, x: f64, y: f64, count: i64) -> usize {
        self.sim.spawn(x, y, count)
    }

    /// Pointer down: start a repeating spawn at (x, y). Returns a hold id.
    fn press(&mut self, x: f64, y: f64) -> u64 {
        let now = self.sim.elapsed();
        let handle = self.sim.begin_spawn(x, y, now);
        let id = handle.id();
        self.holds.insert(id, handle);
        id
    }

    /// Pointer move while held. Returns False if the hold has ended.
    fn move_pointer(&mut self, hold: u64, x: f64, y: f64) -> bool {
        match self.holds.get(&hold) {
            Some(handle) => self.sim.move_spawn(handle, x, y),
            None => false,
        }
    }

    /// Pointer up / leave / cancel. Safe to call more than once.
    fn release(&mut self, hold: u64) {
        if let Some(handle) = self.holds.remove(&hold) {
            handle.cancel();
        }
    }

    /// Advance one frame on the wall clock (releases the GIL during computation).
    ///
    /// Returns (H, Hmax, normalized) when a new entropy sample was taken.
    fn step(&mut self, py: Python<'_>) -> Option<SampleTuple> {
        py.detach(|| self.sim.step_realtime())
            .map(|s| (s.h, s.h_max, s.normalized))
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<f64>::zeros((n, DIM));
        for (i, p) in self.sim.particles().iter().enumerate() {
            for k in 0..DIM {
                arr[[i, k]] = p.r[k];
            }
        }
        let pyarr = arr.into_pyarray(py);
        Ok(pyarr.to_owned().into())
    }

    /// Return velocities as a NumPy array of shape (N, 2), dtype=float64.
    fn get_velocities<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<f64>::zeros((n, DIM));
        for (i, p) in self.sim.particles().iter().enumerate() {
            for k in 0..DIM {
                arr[[i, k]] = p.v[k];
            }
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return RGB colours as a NumPy array of shape (N, 3), dtype=uint8.
    fn get_colors<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<u8>>> {
        let n = self.sim.num_particles();
        let mut arr = Array2::<u8>::zeros((n, 3));
        for (i, view) in self.sim.views().enumerate() {
            for (k, c) in view.tint.to_rgb().into_iter().enumerate() {
                arr[[i, k]] = c;
            }
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Return the entropy history as a (M, 3) NumPy array of [H, Hmax, normalized],
    /// oldest first.
    fn get_history<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let history = self.sim.history();
        let mut arr = Array2::<f64>::zeros((history.len(), 3));
        for (i, s) in history.iter().enumerate() {
            arr[[i, 0]] = s.h;
            arr[[i, 1]] = s.h_max;
            arr[[i, 2]] = s.normalized;
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }

    /// Human-readable text for the latest sample, or None before the first sample.
    fn latest_text(&self) -> Option<String> {
        self.sim.latest().map(|s| s.to_string())
    }

    fn num_particles(&self) -> usize {
        self.sim.num_particles()
    }

    fn kinetic_energy(&self) -> f64 {
        self.sim.kinetic_energy()
    }
}

/// The discgas Python module entry point.
#[pymodule]
fn discgas(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<DiscGas>()?;
    Ok(())
}
