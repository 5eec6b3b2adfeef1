use gridchase::bridge;
use gridchase::config::{BridgeConfig, EnvConfig, RenderMode};
use gridchase::env::{Action, Env, EnvError, GridPursuitEnv, Observation};
use gridchase::inference::{LoadedPolicy, Policy, load_policy};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;
use tracing::debug;

fn runtime_error(err: impl std::fmt::Display) -> PyErr {
    PyRuntimeError::new_err(err.to_string())
}

fn env_error(err: EnvError) -> PyErr {
    match err {
        EnvError::InvalidAction(_) | EnvError::Config(_) => PyValueError::new_err(err.to_string()),
        other => runtime_error(other),
    }
}

fn parse_render_mode(raw: Option<&str>) -> PyResult<RenderMode> {
    match raw {
        None => Ok(RenderMode::None),
        Some("ansi") => Ok(RenderMode::Ansi),
        Some(other) => Err(PyValueError::new_err(format!(
            "unsupported render_mode {other:?}, expected \"ansi\" or None"
        ))),
    }
}

/// The grid pursuit task, stepped from Python.
#[pyclass(name = "GridPursuitEnv", unsendable)]
struct PyGridPursuitEnv {
    inner: GridPursuitEnv,
}

#[pymethods]
impl PyGridPursuitEnv {
    #[new]
    #[pyo3(signature = (grid_size=10, episode_step_budget=50, render_mode=None, seed=None))]
    fn new(
        grid_size: i32,
        episode_step_budget: u32,
        render_mode: Option<&str>,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let env = EnvConfig {
            grid_size,
            episode_step_budget,
            render_mode: parse_render_mode(render_mode)?,
        };

        debug!(grid_size, episode_step_budget, ?seed, "python env created");
        let inner = match seed {
            Some(seed) => GridPursuitEnv::with_seed(env, seed),
            None => GridPursuitEnv::new(env),
        }
        .map_err(env_error)?;
        Ok(Self { inner })
    }

    #[getter]
    fn grid_size(&self) -> i32 {
        self.inner.config().grid_size
    }

    #[pyo3(signature = (seed=None))]
    fn reset<'py>(&mut self, py: Python<'py>, seed: Option<u64>) -> PyResult<(Vec<f32>, Bound<'py, PyDict>)> {
        let (obs, _info) = self.inner.reset(seed).map_err(env_error)?;
        Ok((obs.as_array().to_vec(), PyDict::new(py)))
    }

    /// Returns `(obs, reward, terminated, truncated, info)`.
    #[allow(clippy::type_complexity)]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        action: i64,
    ) -> PyResult<(Vec<f32>, f32, bool, bool, Bound<'py, PyDict>)> {
        let action = Action::try_from(action).map_err(env_error)?;
        let outcome = self.inner.step(action).map_err(env_error)?;
        Ok((
            outcome.obs.as_array().to_vec(),
            outcome.reward,
            outcome.terminated,
            outcome.truncated,
            PyDict::new(py),
        ))
    }

    fn render(&mut self) -> PyResult<Option<String>> {
        let frame = self.inner.render().map_err(env_error)?;
        Ok(frame.map(|f| f.as_text().to_string()))
    }

    fn close(&mut self) -> PyResult<()> {
        self.inner.close().map_err(env_error)
    }
}

/// A trained policy loaded from an artifact.
#[pyclass(name = "Policy", frozen)]
struct PyPolicy {
    inner: LoadedPolicy,
}

#[pymethods]
impl PyPolicy {
    #[staticmethod]
    fn load(path: PathBuf) -> PyResult<Self> {
        let inner = load_policy(&path).map_err(runtime_error)?;
        Ok(Self { inner })
    }

    /// Returns `(action, log_prob)`.
    #[pyo3(signature = (obs, deterministic=true))]
    fn predict(&self, obs: Vec<f32>, deterministic: bool) -> PyResult<(i64, f32)> {
        let values: [f32; Observation::LEN] = obs.as_slice().try_into().map_err(|_| {
            PyValueError::new_err(format!(
                "observation must have {} values, got {}",
                Observation::LEN,
                obs.len()
            ))
        })?;
        let (action, prediction) = self.inner.predict(&Observation(values), deterministic);
        Ok((action.index() as i64, prediction.log_prob))
    }
}

#[pyfunction]
#[pyo3(signature = (value, grid_size=10, arena_half_extent=25.0, grid_scale=5.0))]
fn world_to_observation_coordinate(
    value: f32,
    grid_size: i32,
    arena_half_extent: f32,
    grid_scale: f32,
) -> PyResult<f32> {
    if grid_size < 2 || !(grid_scale > 0.0) {
        return Err(PyValueError::new_err("grid_size must be >= 2 and grid_scale > 0"));
    }
    let config = BridgeConfig {
        grid_size,
        arena_half_extent,
        grid_scale,
        ..BridgeConfig::default()
    };
    Ok(bridge::world_to_observation_coordinate(value, &config))
}

/// `(x, y, z)` unit movement; unknown actions give the zero vector.
#[pyfunction]
fn action_to_movement_vector(action: i64) -> (f32, f32, f32) {
    bridge::action_to_movement_vector(action).into()
}

/// The name of this function must match the lib.name in Cargo.toml
#[pymodule]
fn pygridchase(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGridPursuitEnv>()?;
    m.add_class::<PyPolicy>()?;
    m.add_function(wrap_pyfunction!(world_to_observation_coordinate, m)?)?;
    m.add_function(wrap_pyfunction!(action_to_movement_vector, m)?)?;
    Ok(())
}
