//! Activities: the nodes of a precedence network.
//!
//! An activity carries its identity, a three-point duration estimate, resource
//! rates and its adjacency lists. Anything that depends on neighbouring
//! activities (earliest/latest times, floats) lives in [`crate::analysis`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::NetworkError;

/// Reference reserved for the start sentinel.
pub const START_REFERENCE: &str = "start";
/// Reference reserved for the finish sentinel.
pub const FINISH_REFERENCE: &str = "finish";

/// Arena index of an activity within its network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivityId(pub(crate) u32);

impl ActivityId {
    pub const START: ActivityId = ActivityId(0);
    pub const FINISH: ActivityId = ActivityId(1);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_sentinel(self) -> bool {
        self == Self::START || self == Self::FINISH
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Capability tag distinguishing the sentinels from ordinary activities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Normal,
    /// Accepts no predecessors.
    Start,
    /// Accepts no successors.
    Finish,
}

/// Which of the duration estimates `duration()` reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DurationMode {
    #[default]
    Expected,
    Mean,
    Minimum,
    Maximum,
}

impl DurationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Mean => "mean",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
        }
    }
}

impl FromStr for DurationMode {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expected" => Ok(Self::Expected),
            "mean" => Ok(Self::Mean),
            "minimum" => Ok(Self::Minimum),
            "maximum" => Ok(Self::Maximum),
            other => Err(NetworkError::InvalidConfiguration(format!(
                "Duration mode '{}' is unknown",
                other
            ))),
        }
    }
}

impl fmt::Display for DurationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which start time `start()` reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StartMode {
    #[default]
    Earliest,
    Latest,
    /// Caller-assigned start, see [`Activity::set_dropped_start`].
    Dropped,
}

impl StartMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earliest => "earliest",
            Self::Latest => "latest",
            Self::Dropped => "dropped",
        }
    }
}

impl FromStr for StartMode {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => Ok(Self::Earliest),
            "latest" => Ok(Self::Latest),
            "dropped" => Ok(Self::Dropped),
            other => Err(NetworkError::InvalidConfiguration(format!(
                "Start mode '{}' is unknown",
                other
            ))),
        }
    }
}

impl fmt::Display for StartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schedulable unit of work.
///
/// Equality compares the reference and the effective duration only.
#[derive(Clone, Debug)]
pub struct Activity {
    reference: String,
    description: String,
    expected_duration: f64,
    minimum_duration: f64,
    maximum_duration: f64,
    /// Resource name -> consumption per time unit.
    resources: BTreeMap<String, f64>,
    pub(crate) predecessors: Vec<ActivityId>,
    pub(crate) successors: Vec<ActivityId>,
    duration_mode: DurationMode,
    start_mode: StartMode,
    dropped_start: Option<f64>,
    role: Role,
}

impl Activity {
    /// Create a user activity with zero durations and no resources.
    ///
    /// Fails with `ReservedReference` for `"start"` and `"finish"`.
    pub fn new(reference: impl Into<String>) -> Result<Self, NetworkError> {
        let reference = reference.into();
        if reference == START_REFERENCE || reference == FINISH_REFERENCE {
            return Err(NetworkError::ReservedReference(reference));
        }
        Ok(Self::with_role(reference, String::new(), Role::Normal))
    }

    pub(crate) fn sentinel(role: Role, description: impl Into<String>) -> Self {
        let reference = match role {
            Role::Finish => FINISH_REFERENCE,
            _ => START_REFERENCE,
        };
        Self::with_role(reference.to_string(), description.into(), role)
    }

    fn with_role(reference: String, description: String, role: Role) -> Self {
        Self {
            reference,
            description,
            expected_duration: 0.0,
            minimum_duration: 0.0,
            maximum_duration: 0.0,
            resources: BTreeMap::new(),
            predecessors: Vec::new(),
            successors: Vec::new(),
            duration_mode: DurationMode::Expected,
            start_mode: StartMode::Earliest,
            dropped_start: None,
            role,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_expected_duration(mut self, duration: f64) -> Self {
        self.expected_duration = duration;
        self
    }

    pub fn with_minimum_duration(mut self, duration: f64) -> Self {
        self.minimum_duration = duration;
        self
    }

    pub fn with_maximum_duration(mut self, duration: f64) -> Self {
        self.maximum_duration = duration;
        self
    }

    /// Set all three estimates at once.
    pub fn with_durations(mut self, expected: f64, minimum: f64, maximum: f64) -> Self {
        self.expected_duration = expected;
        self.minimum_duration = minimum;
        self.maximum_duration = maximum;
        self
    }

    pub fn with_resource(mut self, name: impl ToString, rate: f64) -> Self {
        self.set_resource(name, rate);
        self
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn expected_duration(&self) -> f64 {
        self.expected_duration
    }

    pub fn set_expected_duration(&mut self, duration: f64) {
        self.expected_duration = duration;
    }

    pub fn minimum_duration(&self) -> f64 {
        self.minimum_duration
    }

    pub fn set_minimum_duration(&mut self, duration: f64) {
        self.minimum_duration = duration;
    }

    pub fn maximum_duration(&self) -> f64 {
        self.maximum_duration
    }

    pub fn set_maximum_duration(&mut self, duration: f64) {
        self.maximum_duration = duration;
    }

    pub fn resources(&self) -> &BTreeMap<String, f64> {
        &self.resources
    }

    /// Rate of `name` per time unit, 0 if the activity does not use it.
    pub fn resource(&self, name: &str) -> f64 {
        self.resources.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_resource(&mut self, name: impl ToString, rate: f64) {
        self.resources.insert(name.to_string(), rate);
    }

    pub fn remove_resource(&mut self, name: &str) -> Option<f64> {
        self.resources.remove(name)
    }

    /// Predecessors in insertion order.
    pub fn predecessors(&self) -> &[ActivityId] {
        &self.predecessors
    }

    /// Successors in insertion order.
    pub fn successors(&self) -> &[ActivityId] {
        &self.successors
    }

    pub fn has_connections(&self) -> bool {
        !self.predecessors.is_empty() || !self.successors.is_empty()
    }

    pub fn duration_mode(&self) -> DurationMode {
        self.duration_mode
    }

    pub fn set_duration_mode(&mut self, mode: DurationMode) {
        self.duration_mode = mode;
    }

    pub fn start_mode(&self) -> StartMode {
        self.start_mode
    }

    /// Choose the start formula. `Dropped` requires a stored dropped start.
    pub fn set_start_mode(&mut self, mode: StartMode) -> Result<(), NetworkError> {
        if mode == StartMode::Dropped && self.dropped_start.is_none() {
            return Err(NetworkError::InvalidConfiguration(format!(
                "Activity {} has no dropped start assigned",
                self.reference
            )));
        }
        self.start_mode = mode;
        Ok(())
    }

    pub fn dropped_start(&self) -> Option<f64> {
        self.dropped_start
    }

    /// Store a fixed start time used when the start mode is `Dropped`.
    pub fn set_dropped_start(&mut self, start: f64) {
        self.dropped_start = Some(start);
    }

    /// The duration selected by the current duration mode.
    pub fn duration(&self) -> f64 {
        match self.duration_mode {
            DurationMode::Expected => self.expected_duration,
            DurationMode::Mean => self.mean_duration(),
            DurationMode::Minimum => self.minimum_duration,
            DurationMode::Maximum => self.maximum_duration,
        }
    }

    /// PERT mean: `(4 * expected + minimum + maximum) / 6`.
    pub fn mean_duration(&self) -> f64 {
        (4.0 * self.expected_duration + self.minimum_duration + self.maximum_duration) / 6.0
    }

    /// `(maximum - minimum) / 6`.
    pub fn standard_deviation(&self) -> f64 {
        (self.maximum_duration - self.minimum_duration) / 6.0
    }

    pub fn variance(&self) -> f64 {
        self.standard_deviation().powi(2)
    }

    /// Add `id` as a successor. Returns false if it already was one.
    pub(crate) fn register_successor(&mut self, id: ActivityId) -> Result<bool, NetworkError> {
        if self.role == Role::Finish {
            return Err(NetworkError::InvalidTopology(
                "the finish activity can not be a pre-activity of any other activity".to_string(),
            ));
        }
        if self.successors.contains(&id) {
            return Ok(false);
        }
        self.successors.push(id);
        Ok(true)
    }

    /// Add `id` as a predecessor. Returns false if it already was one.
    pub(crate) fn register_predecessor(&mut self, id: ActivityId) -> Result<bool, NetworkError> {
        if self.role == Role::Start {
            return Err(NetworkError::InvalidTopology(
                "the start activity can not be a post-activity of any other activity".to_string(),
            ));
        }
        if self.predecessors.contains(&id) {
            return Ok(false);
        }
        self.predecessors.push(id);
        Ok(true)
    }

    pub(crate) fn deregister_successor(&mut self, id: ActivityId) -> bool {
        let before = self.successors.len();
        self.successors.retain(|&s| s != id);
        self.successors.len() != before
    }

    pub(crate) fn deregister_predecessor(&mut self, id: ActivityId) -> bool {
        let before = self.predecessors.len();
        self.predecessors.retain(|&p| p != id);
        self.predecessors.len() != before
    }

    /// Whether this activity may gain a successor.
    pub(crate) fn accepts_successors(&self) -> bool {
        self.role != Role::Finish
    }

    /// Whether this activity may gain a predecessor.
    pub(crate) fn accepts_predecessors(&self) -> bool {
        self.role != Role::Start
    }
}

impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference && self.duration() == other.duration()
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reference: {}\nDescription: {}\nDuration: {}",
            self.reference,
            self.description,
            self.duration()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_references() {
        assert_eq!(
            Activity::new("start").unwrap_err(),
            NetworkError::ReservedReference("start".to_string())
        );
        assert_eq!(
            Activity::new("finish").unwrap_err(),
            NetworkError::ReservedReference("finish".to_string())
        );
        assert!(Activity::new("Start").is_ok());
    }

    #[test]
    fn test_defaults() {
        let activity = Activity::new("reference").unwrap();
        assert_eq!(activity.reference(), "reference");
        assert_eq!(activity.description(), "");
        assert_eq!(activity.duration(), 0.0);
        assert!(activity.predecessors().is_empty());
        assert!(activity.successors().is_empty());
        assert_eq!(activity.duration_mode(), DurationMode::Expected);
        assert_eq!(activity.start_mode(), StartMode::Earliest);
        assert_eq!(activity.role(), Role::Normal);
    }

    #[test]
    fn test_pert_statistics() {
        let activity = Activity::new("act1").unwrap().with_durations(2.0, 1.0, 4.0);
        assert_eq!(activity.mean_duration(), 13.0 / 6.0);
        assert_eq!(activity.standard_deviation(), 0.5);
        assert_eq!(activity.variance(), 0.25);
    }

    #[test]
    fn test_duration_modes() {
        let mut activity = Activity::new("act1").unwrap().with_durations(2.0, 1.0, 4.0);
        assert_eq!(activity.duration(), 2.0);

        activity.set_duration_mode(DurationMode::Maximum);
        assert_eq!(activity.duration(), 4.0);
        activity.set_duration_mode(DurationMode::Minimum);
        assert_eq!(activity.duration(), 1.0);
        activity.set_duration_mode(DurationMode::Mean);
        assert_eq!(activity.duration(), 13.0 / 6.0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("mean".parse::<DurationMode>(), Ok(DurationMode::Mean));
        assert_eq!("latest".parse::<StartMode>(), Ok(StartMode::Latest));
        assert!(matches!(
            "median".parse::<DurationMode>(),
            Err(NetworkError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            "whenever".parse::<StartMode>(),
            Err(NetworkError::InvalidConfiguration(_))
        ));
        assert_eq!(DurationMode::Maximum.to_string(), "maximum");
    }

    #[test]
    fn test_dropped_start_requires_value() {
        let mut activity = Activity::new("a1").unwrap();
        assert!(matches!(
            activity.set_start_mode(StartMode::Dropped),
            Err(NetworkError::InvalidConfiguration(_))
        ));
        assert_eq!(activity.start_mode(), StartMode::Earliest);

        activity.set_dropped_start(3.5);
        activity.set_start_mode(StartMode::Dropped).unwrap();
        assert_eq!(activity.start_mode(), StartMode::Dropped);
        assert_eq!(activity.dropped_start(), Some(3.5));
    }

    #[test]
    fn test_equality_uses_effective_duration() {
        let a = Activity::new("a1").unwrap().with_expected_duration(1.0);
        let mut b = Activity::new("a1")
            .unwrap()
            .with_expected_duration(1.0)
            .with_description("different");
        assert_eq!(a, b);

        b.set_expected_duration(2.0);
        assert_ne!(a, b);

        b.set_maximum_duration(1.0);
        b.set_duration_mode(DurationMode::Maximum);
        assert_eq!(a, b);
    }

    #[test]
    fn test_resources() {
        let activity = Activity::new("a1").unwrap().with_resource("coffee", 2.5);
        assert_eq!(activity.resource("coffee"), 2.5);
        assert_eq!(activity.resource("tea"), 0.0);

        let mut activity = activity.with_resource('x', 1.0);
        assert_eq!(activity.resource("x"), 1.0);
        assert_eq!(activity.remove_resource("x"), Some(1.0));
        assert_eq!(activity.resources().len(), 1);
    }

    #[test]
    fn test_registration_is_duplicate_free() {
        let mut activity = Activity::new("a1").unwrap();
        assert!(activity.register_successor(ActivityId(5)).unwrap());
        assert!(!activity.register_successor(ActivityId(5)).unwrap());
        assert!(activity.register_predecessor(ActivityId(6)).unwrap());
        assert_eq!(activity.successors(), &[ActivityId(5)]);
        assert_eq!(activity.predecessors(), &[ActivityId(6)]);

        assert!(activity.deregister_successor(ActivityId(5)));
        assert!(!activity.deregister_successor(ActivityId(5)));
        assert!(activity.successors().is_empty());
    }

    #[test]
    fn test_sentinel_capabilities() {
        let mut start = Activity::sentinel(Role::Start, "Begin");
        let mut finish = Activity::sentinel(Role::Finish, "End");
        assert_eq!(start.reference(), START_REFERENCE);
        assert_eq!(finish.reference(), FINISH_REFERENCE);
        assert_eq!(start.description(), "Begin");

        assert!(matches!(
            start.register_predecessor(ActivityId(2)),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert!(matches!(
            finish.register_successor(ActivityId(2)),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert!(start.register_successor(ActivityId(2)).unwrap());
        assert!(finish.register_predecessor(ActivityId(2)).unwrap());
    }

    #[test]
    fn test_display() {
        let activity = Activity::new("a1")
            .unwrap()
            .with_description("Activity1")
            .with_expected_duration(1.5);
        assert_eq!(
            activity.to_string(),
            "Reference: a1\nDescription: Activity1\nDuration: 1.5"
        );
    }
}
