//! Temporal analysis: forward pass, backward pass, floats and critical path.
//!
//! The formulas are defined recursively over the adjacency lists:
//!
//! - `earliest_start(A) = max(earliest_finish(P) for P in preds(A))`, 0 without preds
//! - `earliest_finish(A) = earliest_start(A) + duration(A)`
//! - `latest_finish(A) = min(latest_start(S) for S in succs(A))`, `earliest_finish(A)` without succs
//! - `latest_start(A) = latest_finish(A) - duration(A)`
//!
//! An [`Analysis`] evaluates them with one forward and one backward pass in
//! topological order, run on the first query and kept while it borrows the
//! network. The borrow rules out mutation in the meantime, so the values never
//! go stale.
//!
//! All queries require an acyclic graph. Activities on or after a cycle are
//! left out of the topological order and report `NaN`; the latest times of
//! activities upstream of a cycle are meaningless.

use std::cell::OnceCell;
use std::collections::VecDeque;

#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::activity::{Activity, ActivityId, StartMode};
use crate::log_checks;
use crate::log_debug;
use crate::network::Network;

/// Snapshot of the derived times of one activity.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityTiming {
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    /// `latest_finish - earliest_finish`.
    pub total_float: f64,
    pub early_float: f64,
    pub duration: f64,
}

impl ActivityTiming {
    /// Exact comparison; no epsilon.
    pub fn is_critical(&self) -> bool {
        self.earliest_finish == self.latest_finish
    }
}

/// Kahn's algorithm over the arena: every activity appears after all of its
/// predecessors. Activities on or downstream of a cycle are never emitted.
fn topological_order(network: &Network) -> Vec<ActivityId> {
    let mut in_degree: Vec<usize> = network
        .activities()
        .map(|(_, activity)| activity.predecessors().len())
        .collect();

    let mut queue: VecDeque<ActivityId> = network
        .activities()
        .filter(|(_, activity)| activity.predecessors().is_empty())
        .map(|(id, _)| id)
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &successor in network[id].successors() {
            let degree = &mut in_degree[successor.index()];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(successor);
            }
        }
    }
    order
}

/// Earliest finish and latest start of every activity, indexed by id.
struct Passes {
    earliest_finish: Vec<f64>,
    latest_start: Vec<f64>,
}

impl Passes {
    fn run(network: &Network) -> Self {
        let n = network.activities().count();
        let order = topological_order(network);
        if order.len() < n {
            log_checks!(
                network.verbosity(),
                "[analysis] {} activities are on or after a cycle",
                n - order.len()
            );
        }

        let mut passes = Self {
            earliest_finish: vec![f64::NAN; n],
            latest_start: vec![f64::NAN; n],
        };
        for &id in &order {
            let activity = &network[id];
            let value = passes.earliest_start(activity) + activity.duration();
            passes.earliest_finish[id.index()] = value;
        }
        for &id in order.iter().rev() {
            let activity = &network[id];
            let value = passes.latest_finish(id, activity) - activity.duration();
            passes.latest_start[id.index()] = value;
        }

        log_debug!(
            network.verbosity(),
            "[analysis] forward and backward pass over {} activities",
            order.len()
        );
        passes
    }

    fn earliest_start(&self, activity: &Activity) -> f64 {
        let predecessors = activity.predecessors();
        if predecessors.is_empty() {
            return 0.0;
        }
        predecessors
            .iter()
            .map(|p| self.earliest_finish[p.index()])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn latest_finish(&self, id: ActivityId, activity: &Activity) -> f64 {
        let successors = activity.successors();
        if successors.is_empty() {
            return self.earliest_finish[id.index()];
        }
        successors
            .iter()
            .map(|s| self.latest_start[s.index()])
            .fold(f64::INFINITY, f64::min)
    }
}

/// Evaluator of the temporal formulas over a borrowed network.
pub struct Analysis<'a> {
    network: &'a Network,
    passes: OnceCell<Passes>,
}

impl<'a> Analysis<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self {
            network,
            passes: OnceCell::new(),
        }
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    fn passes(&self) -> &Passes {
        self.passes.get_or_init(|| Passes::run(self.network))
    }

    #[inline]
    fn duration(&self, id: ActivityId) -> f64 {
        self.network[id].duration()
    }

    pub fn earliest_start(&self, id: ActivityId) -> f64 {
        self.passes().earliest_start(&self.network[id])
    }

    pub fn earliest_finish(&self, id: ActivityId) -> f64 {
        self.passes().earliest_finish[id.index()]
    }

    pub fn latest_finish(&self, id: ActivityId) -> f64 {
        self.passes().latest_finish(id, &self.network[id])
    }

    pub fn latest_start(&self, id: ActivityId) -> f64 {
        self.passes().latest_start[id.index()]
    }

    /// Slack before the whole network is delayed.
    pub fn total_float(&self, id: ActivityId) -> f64 {
        self.latest_finish(id) - self.earliest_finish(id)
    }

    /// Slack when every neighbour starts as early as possible.
    pub fn early_float(&self, id: ActivityId) -> f64 {
        let activity = &self.network[id];
        let successors_min_earliest_start = if activity.successors().is_empty() {
            self.latest_finish(id)
        } else {
            activity
                .successors()
                .iter()
                .map(|&s| self.earliest_start(s))
                .fold(f64::INFINITY, f64::min)
        };
        let predecessors_max_earliest_finish = if activity.predecessors().is_empty() {
            0.0
        } else {
            activity
                .predecessors()
                .iter()
                .map(|&p| self.earliest_finish(p))
                .fold(f64::NEG_INFINITY, f64::max)
        };
        successors_min_earliest_start - predecessors_max_earliest_finish - activity.duration()
    }

    pub fn on_critical_path(&self, id: ActivityId) -> bool {
        self.earliest_finish(id) == self.latest_finish(id)
    }

    /// Start time selected by the activity's start mode.
    pub fn start(&self, id: ActivityId) -> f64 {
        let activity = &self.network[id];
        match activity.start_mode() {
            StartMode::Earliest => self.earliest_start(id),
            StartMode::Latest => self.latest_start(id),
            StartMode::Dropped => match activity.dropped_start() {
                Some(start) => start,
                None => self.earliest_start(id),
            },
        }
    }

    pub fn finish(&self, id: ActivityId) -> f64 {
        self.start(id) + self.duration(id)
    }

    /// True iff `start <= time < finish`.
    pub fn active_on(&self, id: ActivityId, time: f64) -> bool {
        self.start(id) <= time && time < self.finish(id)
    }

    /// True iff `[start, finish)` overlaps `[begin, end)`.
    ///
    /// A window that only touches the finish instant does not count.
    pub fn active_during(&self, id: ActivityId, begin: f64, end: f64) -> bool {
        let start = self.start(id);
        let finish = self.finish(id);
        (begin <= start && start < end)
            || (finish > begin && finish < end)
            || (start < begin && finish > begin)
    }

    pub fn timing(&self, id: ActivityId) -> ActivityTiming {
        ActivityTiming {
            earliest_start: self.earliest_start(id),
            earliest_finish: self.earliest_finish(id),
            latest_start: self.latest_start(id),
            latest_finish: self.latest_finish(id),
            total_float: self.total_float(id),
            early_float: self.early_float(id),
            duration: self.duration(id),
        }
    }
}

impl Network {
    /// A memoizing evaluator valid while the network is borrowed.
    pub fn analysis(&self) -> Analysis<'_> {
        Analysis::new(self)
    }

    pub fn earliest_start(&self, id: ActivityId) -> f64 {
        self.analysis().earliest_start(id)
    }

    pub fn earliest_finish(&self, id: ActivityId) -> f64 {
        self.analysis().earliest_finish(id)
    }

    pub fn latest_start(&self, id: ActivityId) -> f64 {
        self.analysis().latest_start(id)
    }

    pub fn latest_finish(&self, id: ActivityId) -> f64 {
        self.analysis().latest_finish(id)
    }

    pub fn total_float(&self, id: ActivityId) -> f64 {
        self.analysis().total_float(id)
    }

    pub fn early_float(&self, id: ActivityId) -> f64 {
        self.analysis().early_float(id)
    }

    pub fn on_critical_path(&self, id: ActivityId) -> bool {
        self.analysis().on_critical_path(id)
    }

    /// Start time of one activity per its start mode.
    pub fn start_of(&self, id: ActivityId) -> f64 {
        self.analysis().start(id)
    }

    /// Finish time of one activity: `start_of(id) + duration`.
    pub fn finish_of(&self, id: ActivityId) -> f64 {
        self.analysis().finish(id)
    }

    /// Time at which the whole network completes.
    pub fn finish(&self) -> f64 {
        self.analysis().finish(ActivityId::FINISH)
    }

    pub fn timing(&self, id: ActivityId) -> ActivityTiming {
        self.analysis().timing(id)
    }

    /// Timings for every activity, sentinels included, in id order.
    pub fn timings(&self) -> Vec<(ActivityId, ActivityTiming)> {
        let analysis = self.analysis();
        self.activities()
            .map(|(id, _)| (id, analysis.timing(id)))
            .collect()
    }

    /// Critical user activities in insertion order.
    pub fn critical_path(&self) -> Vec<ActivityId> {
        let analysis = self.analysis();
        self.user_activities()
            .filter(|(id, _)| analysis.on_critical_path(*id))
            .map(|(id, _)| id)
            .collect()
    }

    /// Sum of the duration variances along the critical path.
    pub fn critical_path_variance(&self) -> f64 {
        self.critical_path()
            .into_iter()
            .map(|id| self[id].variance())
            .sum()
    }

    pub fn critical_path_standard_deviation(&self) -> f64 {
        self.critical_path_variance().sqrt()
    }
}
