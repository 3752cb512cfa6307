//! Time-window queries over a scheduled network.
//!
//! Only user activities are reported; the sentinels have zero length.
//! All intervals are half-open: an activity occupies `[start, finish)`.

use std::ops::{Range, RangeInclusive};

use crate::activity::ActivityId;
use crate::analysis::Analysis;
use crate::error::NetworkError;
use crate::network::Network;

/// A query interval. Inclusive ranges are treated as end-exclusive.
pub trait TimeWindow {
    /// `(begin, end)` of the equivalent end-exclusive window.
    fn bounds(&self) -> (f64, f64);
}

impl TimeWindow for Range<f64> {
    fn bounds(&self) -> (f64, f64) {
        (self.start, self.end)
    }
}

impl TimeWindow for RangeInclusive<f64> {
    fn bounds(&self) -> (f64, f64) {
        (*self.start(), *self.end())
    }
}

fn active_at(analysis: &Analysis<'_>, time: f64) -> Vec<ActivityId> {
    analysis
        .network()
        .user_activities()
        .filter(|(id, _)| analysis.active_on(*id, time))
        .map(|(id, _)| id)
        .collect()
}

/// Number of ticks in `0, tick, .., limit`, tolerant of rounding in `limit / tick`.
///
/// `None` when the count does not fit in a `u64` or `limit` is not finite.
fn step_count(limit: f64, tick: f64) -> Option<u64> {
    if limit < 0.0 {
        return Some(0);
    }
    let n = limit / tick;
    let err = ((limit.abs() + limit.abs()) / tick * f64::EPSILON).min(0.5);
    let last = (n + err).floor();
    if !(last < u64::MAX as f64) {
        return None;
    }
    (last as u64).checked_add(1)
}

/// Iterator over `(time, active activities)` from 0 to `finish - tick`.
///
/// Holds a shared borrow of the network, so every run over an unchanged
/// network yields the same sequence.
pub struct TimeSteps<'a> {
    analysis: Analysis<'a>,
    tick: f64,
    next: u64,
    count: u64,
}

impl<'a> TimeSteps<'a> {
    fn new(network: &'a Network, tick: f64) -> Result<Self, NetworkError> {
        if !tick.is_finite() || tick <= 0.0 {
            return Err(NetworkError::InvalidConfiguration(format!(
                "time step must be positive and finite, got {}",
                tick
            )));
        }
        let analysis = network.analysis();
        let finish = analysis.finish(ActivityId::FINISH);
        let count = step_count(finish - tick, tick).ok_or_else(|| {
            NetworkError::InvalidConfiguration(format!(
                "time step {} is too small for a network finishing at {}",
                tick, finish
            ))
        })?;
        Ok(Self {
            count,
            analysis,
            tick,
            next: 0,
        })
    }
}

impl Iterator for TimeSteps<'_> {
    type Item = (f64, Vec<ActivityId>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let time = self.next as f64 * self.tick;
        self.next += 1;
        Some((time, active_at(&self.analysis, time)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TimeSteps<'_> {}

impl Network {
    /// True iff the activity runs at `time` (`start <= time < finish`).
    pub fn active_on(&self, id: ActivityId, time: f64) -> bool {
        self.analysis().active_on(id, time)
    }

    pub fn active_during(&self, id: ActivityId, window: impl TimeWindow) -> bool {
        let (begin, end) = window.bounds();
        self.analysis().active_during(id, begin, end)
    }

    /// User activities running at `time`, in insertion order.
    pub fn activities_at(&self, time: f64) -> Vec<ActivityId> {
        active_at(&self.analysis(), time)
    }

    /// User activities overlapping `window`, in insertion order.
    pub fn activities_during(&self, window: impl TimeWindow) -> Vec<ActivityId> {
        let (begin, end) = window.bounds();
        let analysis = self.analysis();
        self.user_activities()
            .filter(|(id, _)| analysis.active_during(*id, begin, end))
            .map(|(id, _)| id)
            .collect()
    }

    /// Sample the network every `tick` time units.
    pub fn time_steps(&self, tick: f64) -> Result<TimeSteps<'_>, NetworkError> {
        TimeSteps::new(self, tick)
    }

    pub fn for_each_time_step<F>(&self, tick: f64, mut f: F) -> Result<(), NetworkError>
    where
        F: FnMut(&[ActivityId]),
    {
        for (_, active) in self.time_steps(tick)? {
            f(&active);
        }
        Ok(())
    }

    pub fn for_each_time_step_with_time<F>(&self, tick: f64, mut f: F) -> Result<(), NetworkError>
    where
        F: FnMut(f64, &[ActivityId]),
    {
        for (time, active) in self.time_steps(tick)? {
            f(time, &active);
        }
        Ok(())
    }

    /// Total rate of `resource` over the activities running at `time`.
    pub fn resource_usage_at(&self, time: f64, resource: &str) -> f64 {
        self.activities_at(time)
            .into_iter()
            .map(|id| self[id].resource(resource))
            .sum()
    }

    /// `(time, usage)` of `resource` at every tick.
    pub fn resource_profile(
        &self,
        tick: f64,
        resource: &str,
    ) -> Result<Vec<(f64, f64)>, NetworkError> {
        Ok(self
            .time_steps(tick)?
            .map(|(time, active)| {
                let usage = active.iter().map(|&id| self[id].resource(resource)).sum();
                (time, usage)
            })
            .collect())
    }
}
