//! The precedence network: activity arena plus connectivity rules.
//!
//! # Invariants
//!
//! - `activities[0]` is the start sentinel, `activities[1]` the finish sentinel
//! - Edges are symmetric: `b` in `a.successors` iff `a` in `b.predecessors`
//! - Adjacency lists never contain the same id twice
//! - The graph is assumed acyclic; this is not checked

use std::ops::Index;

use crate::activity::{Activity, ActivityId, DurationMode, Role, StartMode};
use crate::config::NetworkConfig;
use crate::error::NetworkError;
use crate::interner::ReferenceInterner;
use crate::{log_changes, log_checks};

/// A set of activities connected by "must finish before" edges, anchored by
/// the start and finish sentinels.
#[derive(Debug, Clone)]
pub struct Network {
    activities: Vec<Activity>,
    interner: ReferenceInterner,
    config: NetworkConfig,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        let activities = vec![
            Activity::sentinel(Role::Start, config.start_description.clone()),
            Activity::sentinel(Role::Finish, config.finish_description.clone()),
        ];
        Self {
            activities,
            interner: ReferenceInterner::default(),
            config,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub(crate) fn verbosity(&self) -> u8 {
        self.config.verbosity
    }

    /// Add a connection-free activity and return its id.
    pub fn add(&mut self, activity: Activity) -> Result<ActivityId, NetworkError> {
        if self.reference_exists(activity.reference()) {
            log_checks!(
                self.verbosity(),
                "[network] rejected duplicate activity {}",
                activity.reference()
            );
            return Err(NetworkError::DuplicateReference(
                activity.reference().to_string(),
            ));
        }
        if activity.has_connections() {
            log_checks!(
                self.verbosity(),
                "[network] rejected connected activity {}",
                activity.reference()
            );
            return Err(NetworkError::InvalidTopology(format!(
                "can not add activity {} with pre- or post-activities",
                activity.reference()
            )));
        }

        let id = self.interner.intern(activity.reference());
        debug_assert_eq!(id.index(), self.activities.len());
        log_changes!(
            self.verbosity(),
            "[network] added activity {} as {}",
            activity.reference(),
            id
        );
        self.activities.push(activity);
        Ok(id)
    }

    /// Create an activity, let `build` configure it, then add it.
    pub fn new_activity<F>(&mut self, reference: &str, build: F) -> Result<ActivityId, NetworkError>
    where
        F: FnOnce(&mut Activity),
    {
        let mut activity = Activity::new(reference)?;
        build(&mut activity);
        self.add(activity)
    }

    /// True for stored references and the two sentinel references.
    pub fn reference_exists(&self, reference: &str) -> bool {
        self.interner.get(reference).is_some()
    }

    pub fn id(&self, reference: &str) -> Option<ActivityId> {
        self.interner.get(reference)
    }

    pub fn get(&self, reference: &str) -> Option<&Activity> {
        self.id(reference).map(|id| &self.activities[id.index()])
    }

    /// Mutable access to a user activity. Sentinels are not exposed.
    pub fn get_mut(&mut self, reference: &str) -> Option<&mut Activity> {
        let id = self.id(reference)?;
        self.activity_mut(id)
    }

    pub fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.get(id.index())
    }

    /// Mutable access to a user activity. Sentinels are not exposed.
    pub fn activity_mut(&mut self, id: ActivityId) -> Option<&mut Activity> {
        if id.is_sentinel() {
            return None;
        }
        self.activities.get_mut(id.index())
    }

    pub fn start_activity(&self) -> &Activity {
        &self.activities[ActivityId::START.index()]
    }

    pub fn finish_activity(&self) -> &Activity {
        &self.activities[ActivityId::FINISH.index()]
    }

    pub(crate) fn set_sentinel_description(&mut self, id: ActivityId, description: String) {
        if id.is_sentinel() {
            self.activities[id.index()].set_description(description);
        }
    }

    /// Number of user activities (sentinels excluded).
    pub fn len(&self) -> usize {
        self.activities.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every activity in id order, sentinels first.
    pub fn activities(&self) -> impl Iterator<Item = (ActivityId, &Activity)> + '_ {
        self.activities
            .iter()
            .enumerate()
            .map(|(index, activity)| (ActivityId(index as u32), activity))
    }

    /// User activities in insertion order.
    pub fn user_activities(&self) -> impl Iterator<Item = (ActivityId, &Activity)> + '_ {
        self.activities().skip(2)
    }

    fn resolve(&self, reference: &str) -> Result<ActivityId, NetworkError> {
        self.interner.get(reference).ok_or_else(|| {
            log_checks!(self.verbosity(), "[network] unknown reference {}", reference);
            NetworkError::UnknownReference(reference.to_string())
        })
    }

    fn check_id(&self, id: ActivityId) -> Result<(), NetworkError> {
        if id.index() < self.activities.len() {
            Ok(())
        } else {
            Err(NetworkError::UnknownReference(id.to_string()))
        }
    }

    fn reference_of(&self, id: ActivityId) -> &str {
        self.activities[id.index()].reference()
    }

    fn check_edge(&self, pre: ActivityId, post: ActivityId) -> Result<(), NetworkError> {
        self.check_id(pre)?;
        self.check_id(post)?;
        let pre_activity = &self.activities[pre.index()];
        let post_activity = &self.activities[post.index()];
        if !pre_activity.accepts_successors() || !post_activity.accepts_predecessors() {
            log_checks!(
                self.verbosity(),
                "[network] rejected edge {} -> {}",
                pre_activity.reference(),
                post_activity.reference()
            );
            return Err(NetworkError::InvalidTopology(format!(
                "{} can not precede {}",
                pre_activity.reference(),
                post_activity.reference()
            )));
        }
        Ok(())
    }

    /// Register the edge on both endpoints. Returns false if it already existed.
    fn link(&mut self, pre: ActivityId, post: ActivityId) -> Result<bool, NetworkError> {
        self.check_edge(pre, post)?;
        let added = self.activities[pre.index()].register_successor(post)?;
        self.activities[post.index()].register_predecessor(pre)?;
        if added {
            log_changes!(
                self.verbosity(),
                "[network] connected {} -> {}",
                self.reference_of(pre),
                self.reference_of(post)
            );
        }
        Ok(added)
    }

    fn unlink(&mut self, pre: ActivityId, post: ActivityId) -> bool {
        let removed = self.activities[pre.index()].deregister_successor(post);
        self.activities[post.index()].deregister_predecessor(pre);
        if removed {
            log_changes!(
                self.verbosity(),
                "[network] disconnected {} -> {}",
                self.reference_of(pre),
                self.reference_of(post)
            );
        }
        removed
    }

    fn dedup(ids: &[ActivityId]) -> Vec<ActivityId> {
        let mut unique = Vec::with_capacity(ids.len());
        for &id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        unique
    }

    /// Make every id in `successors` a successor of `id`.
    ///
    /// All edges are validated before any is created. Existing edges are a
    /// no-op. Returns the ids processed.
    pub fn connect_successors(
        &mut self,
        id: ActivityId,
        successors: &[ActivityId],
    ) -> Result<Vec<ActivityId>, NetworkError> {
        let successors = Self::dedup(successors);
        for &successor in &successors {
            self.check_edge(id, successor)?;
        }
        for &successor in &successors {
            self.link(id, successor)?;
        }
        Ok(successors)
    }

    /// Make every id in `predecessors` a predecessor of `id`.
    pub fn connect_predecessors(
        &mut self,
        id: ActivityId,
        predecessors: &[ActivityId],
    ) -> Result<Vec<ActivityId>, NetworkError> {
        let predecessors = Self::dedup(predecessors);
        for &predecessor in &predecessors {
            self.check_edge(predecessor, id)?;
        }
        for &predecessor in &predecessors {
            self.link(predecessor, id)?;
        }
        Ok(predecessors)
    }

    /// Remove the edges `id -> s` for every `s`. Missing edges are a no-op.
    pub fn disconnect_successors(
        &mut self,
        id: ActivityId,
        successors: &[ActivityId],
    ) -> Result<Vec<ActivityId>, NetworkError> {
        self.check_id(id)?;
        let successors = Self::dedup(successors);
        for &successor in &successors {
            self.check_id(successor)?;
        }
        for &successor in &successors {
            self.unlink(id, successor);
        }
        Ok(successors)
    }

    /// Remove the edges `p -> id` for every `p`. Missing edges are a no-op.
    pub fn disconnect_predecessors(
        &mut self,
        id: ActivityId,
        predecessors: &[ActivityId],
    ) -> Result<Vec<ActivityId>, NetworkError> {
        self.check_id(id)?;
        let predecessors = Self::dedup(predecessors);
        for &predecessor in &predecessors {
            self.check_id(predecessor)?;
        }
        for &predecessor in &predecessors {
            self.unlink(predecessor, id);
        }
        Ok(predecessors)
    }

    fn resolve_all<I, S>(&self, references: I) -> Result<Vec<ActivityId>, NetworkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        references
            .into_iter()
            .map(|reference| self.resolve(reference.as_ref()))
            .collect()
    }

    /// Make `pre_ref` a predecessor of every reference in `post_refs`.
    ///
    /// Either every edge is created or, on error, nothing changes.
    pub fn connect<I, S>(&mut self, pre_ref: &str, post_refs: I) -> Result<(), NetworkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pre = self.resolve(pre_ref)?;
        let posts = self.resolve_all(post_refs)?;
        self.connect_successors(pre, &posts).map(|_| ())
    }

    /// Remove the edges from `pre_ref` to every reference in `post_refs`.
    pub fn disconnect<I, S>(&mut self, pre_ref: &str, post_refs: I) -> Result<(), NetworkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pre = self.resolve(pre_ref)?;
        let posts = self.resolve_all(post_refs)?;
        self.disconnect_successors(pre, &posts).map(|_| ())
    }

    /// Attach dangling activities to the sentinels.
    ///
    /// Every user activity without predecessors gets an edge from start,
    /// every one without successors an edge to finish. Must run before any
    /// temporal query. Returns the number of edges created.
    pub fn fix_connections(&mut self) -> Result<usize, NetworkError> {
        let mut created = 0;
        for index in 2..self.activities.len() {
            let id = ActivityId(index as u32);
            if self.activities[index].predecessors.is_empty() && self.link(ActivityId::START, id)? {
                created += 1;
            }
            if self.activities[index].successors.is_empty() && self.link(id, ActivityId::FINISH)? {
                created += 1;
            }
        }
        log_changes!(
            self.verbosity(),
            "[network] fix_connections created {} edges",
            created
        );
        Ok(created)
    }

    /// Set the duration mode of every user activity.
    pub fn set_duration_mode_all(&mut self, mode: DurationMode) {
        for activity in self.activities.iter_mut().skip(2) {
            activity.set_duration_mode(mode);
        }
    }

    /// Set the start mode of every user activity. Nothing changes on error.
    pub fn set_start_mode_all(&mut self, mode: StartMode) -> Result<(), NetworkError> {
        if mode == StartMode::Dropped {
            if let Some((_, missing)) = self
                .user_activities()
                .find(|(_, activity)| activity.dropped_start().is_none())
            {
                return Err(NetworkError::InvalidConfiguration(format!(
                    "Activity {} has no dropped start assigned",
                    missing.reference()
                )));
            }
        }
        for activity in self.activities.iter_mut().skip(2) {
            activity.set_start_mode(mode)?;
        }
        Ok(())
    }

    /// Text summary of an activity including the references it depends on.
    pub fn describe(&self, id: ActivityId) -> Option<String> {
        let activity = self.activity(id)?;
        let mut text = activity.to_string();
        if !activity.predecessors.is_empty() {
            let depends_on: Vec<&str> = activity
                .predecessors
                .iter()
                .map(|&p| self.reference_of(p))
                .collect();
            text.push_str("\nDepends on:\n ");
            text.push_str(&depends_on.join(","));
        }
        Some(text)
    }
}

impl Index<ActivityId> for Network {
    type Output = Activity;

    fn index(&self, id: ActivityId) -> &Activity {
        &self.activities[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(reference: &str, duration: f64) -> Activity {
        Activity::new(reference)
            .unwrap()
            .with_expected_duration(duration)
    }

    fn three_activity_network() -> Network {
        let mut network = Network::new();
        network.add(activity("a1", 1.0)).unwrap();
        network.add(activity("a2", 2.0)).unwrap();
        network.add(activity("a3", 3.0)).unwrap();
        network
    }

    fn successors<'a>(network: &'a Network, reference: &str) -> Vec<&'a str> {
        network
            .get(reference)
            .unwrap()
            .successors()
            .iter()
            .map(|&id| network[id].reference())
            .collect()
    }

    fn predecessors<'a>(network: &'a Network, reference: &str) -> Vec<&'a str> {
        network
            .get(reference)
            .unwrap()
            .predecessors()
            .iter()
            .map(|&id| network[id].reference())
            .collect()
    }

    #[test]
    fn test_new_network() {
        let network = Network::new();
        assert_eq!(network.len(), 0);
        assert!(network.is_empty());
        assert_eq!(network.get("start").unwrap().reference(), "start");
        assert_eq!(network.get("finish").unwrap().reference(), "finish");
        assert_eq!(network.start_activity().role(), Role::Start);
        assert_eq!(network.finish_activity().role(), Role::Finish);
        assert_eq!(network.activities().count(), 2);
        assert_eq!(network.user_activities().count(), 0);
    }

    #[test]
    fn test_sentinel_descriptions_from_config() {
        let network =
            Network::with_config(NetworkConfig::default().with_descriptions("Begin", "End"));
        assert_eq!(network.start_activity().description(), "Begin");
        assert_eq!(network.finish_activity().description(), "End");
    }

    #[test]
    fn test_add_activity() {
        let mut network = Network::new();
        let id = network.add(activity("a1", 1.0)).unwrap();
        assert_eq!(network.len(), 1);
        assert_eq!(network[id].reference(), "a1");
        assert_eq!(network.id("a1"), Some(id));

        assert_eq!(
            network.add(activity("a1", 5.0)).unwrap_err(),
            NetworkError::DuplicateReference("a1".to_string())
        );
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn test_add_rejects_connected_activity() {
        let mut source = three_activity_network();
        source.connect("a1", ["a2"]).unwrap();
        let connected = source.get("a1").unwrap().clone();

        let mut network = Network::new();
        assert!(matches!(
            network.add(connected),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert_eq!(network.len(), 0);
    }

    #[test]
    fn test_add_rejects_sentinel_clone() {
        let mut network = Network::new();
        let start = network.start_activity().clone();
        assert_eq!(
            network.add(start).unwrap_err(),
            NetworkError::DuplicateReference("start".to_string())
        );
    }

    #[test]
    fn test_new_activity() {
        let mut network = Network::new();
        let id = network
            .new_activity("a2", |act| {
                act.set_expected_duration(2.0);
                act.set_description("Activity Two");
            })
            .unwrap();
        assert_eq!(network[id].duration(), 2.0);
        assert_eq!(network[id].description(), "Activity Two");

        assert_eq!(
            network.new_activity("start", |_| {}).unwrap_err(),
            NetworkError::ReservedReference("start".to_string())
        );
    }

    #[test]
    fn test_connect() {
        let mut network = three_activity_network();
        network.connect("a1", ["a2"]).unwrap();
        assert_eq!(successors(&network, "a1"), vec!["a2"]);
        assert_eq!(predecessors(&network, "a2"), vec!["a1"]);

        network.connect("a1", ["a2"]).unwrap();
        assert_eq!(successors(&network, "a1"), vec!["a2"]);

        network.connect("a1", ["a3", "a3"]).unwrap();
        assert_eq!(successors(&network, "a1"), vec!["a2", "a3"]);
    }

    #[test]
    fn test_connect_is_all_or_nothing() {
        let mut network = three_activity_network();
        assert_eq!(
            network.connect("a1", ["a2", "bogus reference"]).unwrap_err(),
            NetworkError::UnknownReference("bogus reference".to_string())
        );
        assert!(successors(&network, "a1").is_empty());
        assert!(predecessors(&network, "a2").is_empty());

        assert_eq!(
            network.connect("bogus reference", ["a2"]).unwrap_err(),
            NetworkError::UnknownReference("bogus reference".to_string())
        );

        assert!(matches!(
            network.connect("a1", ["a2", "start"]),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert!(successors(&network, "a1").is_empty());
    }

    #[test]
    fn test_sentinel_edge_rules() {
        let mut network = three_activity_network();
        assert!(matches!(
            network.connect("a1", ["start"]),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert!(matches!(
            network.connect("finish", ["a1"]),
            Err(NetworkError::InvalidTopology(_))
        ));
        network.connect("start", ["a1"]).unwrap();
        network.connect("a1", ["finish"]).unwrap();
        assert_eq!(predecessors(&network, "a1"), vec!["start"]);
        assert_eq!(successors(&network, "a1"), vec!["finish"]);
    }

    #[test]
    fn test_connect_predecessors() {
        let mut network = three_activity_network();
        let a1 = network.id("a1").unwrap();
        let a2 = network.id("a2").unwrap();
        let a3 = network.id("a3").unwrap();

        let processed = network.connect_predecessors(a3, &[a1, a2, a1]).unwrap();
        assert_eq!(processed, vec![a1, a2]);
        assert_eq!(predecessors(&network, "a3"), vec!["a1", "a2"]);
        assert_eq!(successors(&network, "a2"), vec!["a3"]);

        assert!(matches!(
            network.connect_predecessors(ActivityId::START, &[a1]),
            Err(NetworkError::InvalidTopology(_))
        ));
        assert!(matches!(
            network.connect_successors(a1, &[ActivityId(42)]),
            Err(NetworkError::UnknownReference(_))
        ));
    }

    #[test]
    fn test_disconnect() {
        let mut network = three_activity_network();
        network.connect("a1", ["a2", "a3"]).unwrap();

        network.disconnect("a1", ["a2"]).unwrap();
        assert_eq!(successors(&network, "a1"), vec!["a3"]);
        assert!(predecessors(&network, "a2").is_empty());

        network.disconnect("a1", ["a2"]).unwrap();
        assert_eq!(successors(&network, "a1"), vec!["a3"]);

        assert_eq!(
            network.disconnect("a1", ["a3", "bogus"]).unwrap_err(),
            NetworkError::UnknownReference("bogus".to_string())
        );
        assert_eq!(successors(&network, "a1"), vec!["a3"]);

        let a1 = network.id("a1").unwrap();
        let a3 = network.id("a3").unwrap();
        assert_eq!(network.disconnect_predecessors(a3, &[a1]).unwrap(), vec![a1]);
        assert!(successors(&network, "a1").is_empty());
    }

    #[test]
    fn test_reference_exists() {
        let network = three_activity_network();
        assert!(network.reference_exists("a1"));
        assert!(network.reference_exists("start"));
        assert!(network.reference_exists("finish"));
        assert!(!network.reference_exists("a4"));
    }

    #[test]
    fn test_fix_connections() {
        let mut network = three_activity_network();
        network.connect("a1", ["a2", "a3"]).unwrap();

        let created = network.fix_connections().unwrap();
        assert_eq!(created, 3);
        assert_eq!(predecessors(&network, "a1"), vec!["start"]);
        assert_eq!(successors(&network, "a2"), vec!["finish"]);
        assert_eq!(successors(&network, "a3"), vec!["finish"]);
        assert_eq!(predecessors(&network, "finish"), vec!["a2", "a3"]);
        assert_eq!(successors(&network, "start"), vec!["a1"]);
        assert!(network.finish_activity().successors().is_empty());
        assert!(network.start_activity().predecessors().is_empty());
    }

    #[test]
    fn test_fix_connections_idempotent() {
        let mut network = three_activity_network();
        network.connect("a1", ["a2"]).unwrap();
        network.fix_connections().unwrap();
        let snapshot: Vec<(Vec<ActivityId>, Vec<ActivityId>)> = network
            .activities()
            .map(|(_, a)| (a.predecessors().to_vec(), a.successors().to_vec()))
            .collect();

        assert_eq!(network.fix_connections().unwrap(), 0);
        let again: Vec<(Vec<ActivityId>, Vec<ActivityId>)> = network
            .activities()
            .map(|(_, a)| (a.predecessors().to_vec(), a.successors().to_vec()))
            .collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_sentinels_not_mutable() {
        let mut network = three_activity_network();
        assert!(network.activity_mut(ActivityId::START).is_none());
        assert!(network.get_mut("finish").is_none());
        network.get_mut("a1").unwrap().set_expected_duration(7.0);
        assert_eq!(network.get("a1").unwrap().duration(), 7.0);
    }

    #[test]
    fn test_bulk_modes() {
        let mut network = three_activity_network();
        network.get_mut("a1").unwrap().set_maximum_duration(4.0);
        network.set_duration_mode_all(DurationMode::Maximum);
        assert_eq!(network.get("a1").unwrap().duration(), 4.0);
        assert_eq!(network.get("a2").unwrap().duration(), 0.0);
        assert_eq!(
            network.start_activity().duration_mode(),
            DurationMode::Expected
        );

        network.get_mut("a1").unwrap().set_dropped_start(1.0);
        assert!(matches!(
            network.set_start_mode_all(StartMode::Dropped),
            Err(NetworkError::InvalidConfiguration(_))
        ));
        assert_eq!(network.get("a1").unwrap().start_mode(), StartMode::Earliest);

        network.set_start_mode_all(StartMode::Latest).unwrap();
        assert_eq!(network.get("a3").unwrap().start_mode(), StartMode::Latest);
    }

    #[test]
    fn test_describe() {
        let mut network = three_activity_network();
        network.connect("a1", ["a3"]).unwrap();
        network.connect("a2", ["a3"]).unwrap();
        let a3 = network.id("a3").unwrap();
        assert_eq!(
            network.describe(a3).unwrap(),
            "Reference: a3\nDescription: \nDuration: 3\nDepends on:\n a1,a2"
        );
        assert!(network.describe(ActivityId(99)).is_none());
    }
}
