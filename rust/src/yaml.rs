//! Structured import/export as a stream of YAML documents.
//!
//! Each user activity is one document keyed by its reference:
//!
//! ```yaml
//! ---
//! a1:
//!   description: Dig foundations
//!   expected duration: 3.0
//!   minimum duration: 2.0
//!   maximum duration: 6.0
//!   post activities:
//!   - a2
//!   resources:
//!     concrete: 5.0
//! ```
//!
//! Zero durations and empty collections are left out. The sentinels are not
//! exported; when a `start` or `finish` record is imported only its
//! description is used.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::activity::{Activity, ActivityId, FINISH_REFERENCE, START_REFERENCE};
use crate::config::NetworkConfig;
use crate::error::NetworkError;
use crate::log_changes;
use crate::network::Network;

/// Errors from reading or writing the YAML format.
#[derive(Error, Debug)]
pub enum YamlError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("Malformed activity record: {0}")]
    MalformedRecord(String),
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

fn is_blank(value: &&str) -> bool {
    value.is_empty()
}

fn no_resources(resources: &&BTreeMap<String, f64>) -> bool {
    resources.is_empty()
}

#[derive(Serialize)]
struct ExportRecord<'a> {
    #[serde(skip_serializing_if = "is_blank")]
    description: &'a str,
    #[serde(rename = "expected duration", skip_serializing_if = "is_zero")]
    expected_duration: f64,
    #[serde(rename = "minimum duration", skip_serializing_if = "is_zero")]
    minimum_duration: f64,
    #[serde(rename = "maximum duration", skip_serializing_if = "is_zero")]
    maximum_duration: f64,
    #[serde(rename = "post activities", skip_serializing_if = "Vec::is_empty")]
    post_activities: Vec<&'a str>,
    #[serde(skip_serializing_if = "no_resources")]
    resources: &'a BTreeMap<String, f64>,
}

/// Loosely typed record: scalars are coerced the way a hand-written file expects.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ImportRecord {
    description: Option<Value>,
    #[serde(rename = "expected duration")]
    expected_duration: Option<Value>,
    #[serde(rename = "minimum duration")]
    minimum_duration: Option<Value>,
    #[serde(rename = "maximum duration")]
    maximum_duration: Option<Value>,
    #[serde(rename = "post activities")]
    post_activities: Option<Vec<Value>>,
    resources: Option<Mapping>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl ImportRecord {
    fn description(&self) -> Option<String> {
        self.description.as_ref().and_then(scalar_to_string)
    }

    fn duration(value: &Option<Value>, reference: &str, key: &str) -> Result<f64, YamlError> {
        match value {
            None => Ok(0.0),
            Some(v) => scalar_to_float(v).ok_or_else(|| {
                YamlError::MalformedRecord(format!("{}: {} is not a number", reference, key))
            }),
        }
    }

    fn to_activity(&self, reference: &str) -> Result<Activity, YamlError> {
        let mut activity = Activity::new(reference)?
            .with_description(self.description().unwrap_or_default())
            .with_durations(
                Self::duration(&self.expected_duration, reference, "expected duration")?,
                Self::duration(&self.minimum_duration, reference, "minimum duration")?,
                Self::duration(&self.maximum_duration, reference, "maximum duration")?,
            );
        for (name, rate) in self.resources.iter().flatten() {
            let name = scalar_to_string(name).ok_or_else(|| {
                YamlError::MalformedRecord(format!("{}: resource names must be scalars", reference))
            })?;
            let rate = scalar_to_float(rate).ok_or_else(|| {
                YamlError::MalformedRecord(format!("{}: resource {} is not a number", reference, name))
            })?;
            activity.set_resource(name, rate);
        }
        Ok(activity)
    }

    fn post_references(&self, reference: &str) -> Result<Vec<String>, YamlError> {
        self.post_activities
            .iter()
            .flatten()
            .map(|value| {
                scalar_to_string(value).ok_or_else(|| {
                    YamlError::MalformedRecord(format!(
                        "{}: post activities must be references",
                        reference
                    ))
                })
            })
            .collect()
    }
}

fn parse_records(text: &str) -> Result<Vec<(String, ImportRecord)>, YamlError> {
    let mut records = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let mapping = match Value::deserialize(document)? {
            Value::Null => continue,
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(YamlError::MalformedRecord(
                    "document is not a mapping of references".to_string(),
                ))
            }
        };
        for (key, value) in mapping {
            let reference = scalar_to_string(&key).ok_or_else(|| {
                YamlError::MalformedRecord("activity references must be scalars".to_string())
            })?;
            let record = match value {
                Value::Null => ImportRecord::default(),
                other => serde_yaml::from_value(other)?,
            };
            records.push((reference, record));
        }
    }
    Ok(records)
}

impl Network {
    /// One YAML document describing a single activity.
    pub fn activity_to_yaml(&self, id: ActivityId) -> Result<String, YamlError> {
        let activity = self
            .activity(id)
            .ok_or_else(|| NetworkError::UnknownReference(id.to_string()))?;
        let record = ExportRecord {
            description: activity.description(),
            expected_duration: activity.expected_duration(),
            minimum_duration: activity.minimum_duration(),
            maximum_duration: activity.maximum_duration(),
            post_activities: activity
                .successors()
                .iter()
                .map(|&s| self[s].reference())
                .collect(),
            resources: activity.resources(),
        };
        let mut document = BTreeMap::new();
        document.insert(activity.reference(), record);
        Ok(format!("---\n{}", serde_yaml::to_string(&document)?))
    }

    /// Every user activity as a stream of YAML documents.
    pub fn to_yaml(&self) -> Result<String, YamlError> {
        let documents = self
            .user_activities()
            .map(|(id, _)| self.activity_to_yaml(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents.join(""))
    }

    pub fn from_yaml(text: &str) -> Result<Network, YamlError> {
        Self::from_yaml_with_config(text, NetworkConfig::default())
    }

    /// Rebuild a network: activities first, then every recorded edge.
    pub fn from_yaml_with_config(text: &str, config: NetworkConfig) -> Result<Network, YamlError> {
        let records = parse_records(text)?;
        let mut network = Network::with_config(config);

        for (reference, record) in &records {
            let sentinel = match reference.as_str() {
                START_REFERENCE => Some(ActivityId::START),
                FINISH_REFERENCE => Some(ActivityId::FINISH),
                _ => None,
            };
            match sentinel {
                Some(id) => network.set_sentinel_description(
                    id,
                    record.description().unwrap_or_else(|| reference.clone()),
                ),
                None => {
                    network.add(record.to_activity(reference)?)?;
                }
            }
        }

        for (reference, record) in &records {
            if reference == START_REFERENCE || reference == FINISH_REFERENCE {
                continue;
            }
            let posts = record.post_references(reference)?;
            if !posts.is_empty() {
                network.connect(reference, &posts)?;
            }
        }

        log_changes!(
            network.verbosity(),
            "[yaml] imported {} activities",
            network.len()
        );
        Ok(network)
    }
}
