//! Python bindings (feature `python`).
//!
//! Activities are addressed by reference on the Python side; every error is
//! raised as `ValueError`.

use chrono::NaiveDate;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::activity::{Activity, ActivityId, DurationMode, StartMode};
use crate::analysis::ActivityTiming;
use crate::calendar::ScheduledActivity;
use crate::config::NetworkConfig;
use crate::network::Network;

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// A precedence network (PyO3 wrapper).
#[pyclass(name = "Network")]
pub struct PyNetwork {
    inner: Network,
}

impl PyNetwork {
    fn id(&self, reference: &str) -> PyResult<ActivityId> {
        self.inner
            .id(reference)
            .ok_or_else(|| value_error(format!("Activity with reference {} was not found", reference)))
    }

    fn activity_mut(&mut self, reference: &str) -> PyResult<&mut Activity> {
        self.inner
            .get_mut(reference)
            .ok_or_else(|| value_error(format!("Activity {} is not a mutable user activity", reference)))
    }

    fn references(&self, ids: Vec<ActivityId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| self.inner[id].reference().to_string())
            .collect()
    }
}

#[pymethods]
impl PyNetwork {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<NetworkConfig>) -> Self {
        Self {
            inner: Network::with_config(config.unwrap_or_default()),
        }
    }

    #[pyo3(signature = (
        reference,
        expected_duration=0.0,
        minimum_duration=0.0,
        maximum_duration=0.0,
        description=None,
        resources=None
    ))]
    fn new_activity(
        &mut self,
        reference: &str,
        expected_duration: f64,
        minimum_duration: f64,
        maximum_duration: f64,
        description: Option<String>,
        resources: Option<HashMap<String, f64>>,
    ) -> PyResult<()> {
        let mut activity = Activity::new(reference)
            .map_err(value_error)?
            .with_durations(expected_duration, minimum_duration, maximum_duration)
            .with_description(description.unwrap_or_default());
        for (name, rate) in resources.unwrap_or_default() {
            activity.set_resource(name, rate);
        }
        self.inner.add(activity).map_err(value_error)?;
        Ok(())
    }

    fn connect(&mut self, pre_ref: &str, post_refs: Vec<String>) -> PyResult<()> {
        self.inner.connect(pre_ref, &post_refs).map_err(value_error)
    }

    fn disconnect(&mut self, pre_ref: &str, post_refs: Vec<String>) -> PyResult<()> {
        self.inner.disconnect(pre_ref, &post_refs).map_err(value_error)
    }

    fn fix_connections(&mut self) -> PyResult<usize> {
        self.inner.fix_connections().map_err(value_error)
    }

    fn reference_exists(&self, reference: &str) -> bool {
        self.inner.reference_exists(reference)
    }

    fn set_duration_mode(&mut self, reference: &str, mode: &str) -> PyResult<()> {
        let mode: DurationMode = mode.parse().map_err(value_error)?;
        self.activity_mut(reference)?.set_duration_mode(mode);
        Ok(())
    }

    fn set_start_mode(&mut self, reference: &str, mode: &str) -> PyResult<()> {
        let mode: StartMode = mode.parse().map_err(value_error)?;
        self.activity_mut(reference)?
            .set_start_mode(mode)
            .map_err(value_error)
    }

    fn set_dropped_start(&mut self, reference: &str, start: f64) -> PyResult<()> {
        self.activity_mut(reference)?.set_dropped_start(start);
        Ok(())
    }

    fn timing(&self, reference: &str) -> PyResult<ActivityTiming> {
        Ok(self.inner.timing(self.id(reference)?))
    }

    fn on_critical_path(&self, reference: &str) -> PyResult<bool> {
        Ok(self.inner.on_critical_path(self.id(reference)?))
    }

    fn critical_path(&self) -> Vec<String> {
        self.references(self.inner.critical_path())
    }

    fn critical_path_variance(&self) -> f64 {
        self.inner.critical_path_variance()
    }

    fn finish(&self) -> f64 {
        self.inner.finish()
    }

    fn activities_at(&self, time: f64) -> Vec<String> {
        self.references(self.inner.activities_at(time))
    }

    fn activities_during(&self, begin: f64, end: f64) -> Vec<String> {
        self.references(self.inner.activities_during(begin..end))
    }

    fn resource_profile(&self, tick: f64, resource: &str) -> PyResult<Vec<(f64, f64)>> {
        self.inner
            .resource_profile(tick, resource)
            .map_err(value_error)
    }

    fn calendar(&self, project_start: NaiveDate) -> PyResult<Vec<ScheduledActivity>> {
        self.inner.calendar(project_start).map_err(value_error)
    }

    fn to_yaml(&self) -> PyResult<String> {
        self.inner.to_yaml().map_err(value_error)
    }

    #[staticmethod]
    fn from_yaml(text: &str) -> PyResult<Self> {
        Ok(Self {
            inner: Network::from_yaml(text).map_err(value_error)?,
        })
    }

    fn to_dot(&self) -> String {
        self.inner.to_dot()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!("Network(activities={})", self.inner.len())
    }
}

/// The precedence Python module.
#[pymodule]
fn precedence(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyNetwork>()?;
    m.add_class::<NetworkConfig>()?;
    m.add_class::<ActivityTiming>()?;
    m.add_class::<ScheduledActivity>()?;
    Ok(())
}
