//! Configuration types for precedence networks.

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Network-wide settings fixed at construction.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub verbosity: u8,
    /// Description of the start sentinel.
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub start_description: String,
    /// Description of the finish sentinel.
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub finish_description: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            start_description: "start".to_string(),
            finish_description: "finish".to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_descriptions(
        mut self,
        start_description: impl Into<String>,
        finish_description: impl Into<String>,
    ) -> Self {
        self.start_description = start_description.into();
        self.finish_description = finish_description.into();
        self
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl NetworkConfig {
    #[new]
    #[pyo3(signature = (verbosity=None, start_description=None, finish_description=None))]
    fn new(
        verbosity: Option<u8>,
        start_description: Option<String>,
        finish_description: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            start_description: start_description.unwrap_or(defaults.start_description),
            finish_description: finish_description.unwrap_or(defaults.finish_description),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "NetworkConfig(verbosity={}, start_description={:?}, finish_description={:?})",
            self.verbosity, self.start_description, self.finish_description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.start_description, "start");
        assert_eq!(config.finish_description, "finish");
    }

    #[test]
    fn test_config_builders() {
        let config = NetworkConfig::default()
            .with_verbosity(2)
            .with_descriptions("Begin", "End");
        assert_eq!(config.verbosity, 2);
        assert_eq!(config.start_description, "Begin");
        assert_eq!(config.finish_description, "End");
    }
}
