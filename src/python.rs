//! Python bindings, built with the `python` feature.
//!
//! The core types stay free of PyO3 attributes; thin wrapper classes carry
//! them across the boundary. Detector errors surface as `ValueError`.

use crate::error::ColliderError;
use crate::prediction::{ForecastMode, PredictionParams, DEFAULT_TIME_STEP};
use crate::structs::{self, Agv, Point, Pose};
use crate::{fleet, schedule};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

impl From<ColliderError> for PyErr {
    fn from(err: ColliderError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pyclass(name = "Point")]
#[derive(Debug, Clone, Copy)]
pub struct PyPoint {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
}

#[pymethods]
impl PyPoint {
    #[new]
    fn new(x: f64, y: f64) -> Self {
        PyPoint { x, y }
    }

    fn distance(&self, other: &PyPoint) -> f64 {
        Point::from(*self).distance(&Point::from(*other))
    }

    fn __str__(&self) -> String {
        Point::from(*self).to_string()
    }
}

impl From<PyPoint> for Point {
    fn from(p: PyPoint) -> Point {
        Point::new(p.x, p.y)
    }
}

impl From<Point> for PyPoint {
    fn from(p: Point) -> PyPoint {
        PyPoint { x: p.x, y: p.y }
    }
}

#[pyclass(name = "Pose")]
#[derive(Debug, Clone, Copy)]
pub struct PyPose {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
    #[pyo3(get, set)]
    pub heading: f64,
}

#[pymethods]
impl PyPose {
    #[new]
    fn new(x: f64, y: f64, heading: f64) -> Self {
        PyPose { x, y, heading }
    }

    fn __str__(&self) -> String {
        Pose::from(*self).to_string()
    }
}

impl From<PyPose> for Pose {
    fn from(p: PyPose) -> Pose {
        Pose::new(p.x, p.y, p.heading)
    }
}

impl From<Pose> for PyPose {
    fn from(p: Pose) -> PyPose {
        PyPose { x: p.x, y: p.y, heading: p.heading }
    }
}

#[pyclass(name = "Agv")]
#[derive(Debug, Clone)]
pub struct PyAgv {
    inner: Agv,
}

#[pymethods]
impl PyAgv {
    #[new]
    fn new(id: usize, width: f64, pose: PyPose, speed: f64, path: Vec<PyPoint>) -> Self {
        let path = path.into_iter().map(Point::from).collect();
        PyAgv {
            inner: Agv::new(id, width, pose.into(), speed, path),
        }
    }

    #[getter]
    fn id(&self) -> usize {
        self.inner.id
    }

    #[getter]
    fn width(&self) -> f64 {
        self.inner.width
    }

    #[getter]
    fn speed(&self) -> f64 {
        self.inner.speed
    }

    #[getter]
    fn pose(&self) -> PyPose {
        self.inner.pose.into()
    }

    #[getter]
    fn path(&self) -> Vec<PyPoint> {
        self.inner.path.iter().copied().map(PyPoint::from).collect()
    }

    /// Pose `dt` seconds ahead along the planned path.
    fn forecast_pose(&self, dt: f64) -> PyPose {
        self.inner.forecast_pose(dt).into()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

fn unwrap_fleet(agvs: Vec<PyAgv>) -> Vec<Agv> {
    agvs.into_iter().map(|a| a.inner).collect()
}

/// Returns `(agv_id, action, wait_time, conflict_point)` per action, two per
/// conflict. Wait times are already clamped to zero.
#[pyfunction]
fn detect_and_schedule(
    agvs: Vec<PyAgv>,
    time_tolerance: f64,
    radius: f64,
    safe_gap: f64,
) -> PyResult<Vec<(usize, String, f64, PyPoint)>> {
    let vehicles = unwrap_fleet(agvs);
    let actions = schedule::detect_and_schedule(&vehicles, time_tolerance, radius, safe_gap)?;
    Ok(actions
        .iter()
        .map(|a| (a.agv, a.action.to_string(), a.effective_wait(), a.collision.point.into()))
        .collect())
}

/// Returns `(agv1, agv2, time, point, distance, risk)` per predicted conflict.
#[pyfunction]
#[pyo3(signature = (agvs, time_range, time_step=DEFAULT_TIME_STEP, threshold=0.0, compounding=false, use_index=true))]
fn predict_collisions(
    agvs: Vec<PyAgv>,
    time_range: f64,
    time_step: f64,
    threshold: f64,
    compounding: bool,
    use_index: bool,
) -> PyResult<Vec<(usize, usize, f64, PyPoint, f64, String)>> {
    let mode = if compounding {
        ForecastMode::Compounding
    } else {
        ForecastMode::Fixed
    };
    let params = PredictionParams::new(time_range, time_step, threshold).with_mode(mode);
    let mut vehicles = unwrap_fleet(agvs);
    let hits = fleet::predict_collisions_for_fleet(&mut vehicles, &params, use_index, fleet::INDEX_MIN_FLEET_SIZE)?;
    Ok(hits
        .iter()
        .map(|h| {
            (
                h.agv1,
                h.agv2,
                h.collision_time,
                h.collision_point.into(),
                h.distance,
                h.risk_level().to_string(),
            )
        })
        .collect())
}

#[pyfunction]
fn path_length(path: Vec<PyPoint>) -> f64 {
    let path: Vec<Point> = path.into_iter().map(Point::from).collect();
    structs::path_length(&path)
}

#[pymodule]
fn agv_collider(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data structures
    m.add_class::<PyPoint>()?;
    m.add_class::<PyPose>()?;
    m.add_class::<PyAgv>()?;

    // Detection and scheduling
    m.add_function(wrap_pyfunction!(detect_and_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(predict_collisions, m)?)?;

    // Utility functions
    m.add_function(wrap_pyfunction!(path_length, m)?)?;

    Ok(())
}
