//! Projection of network time offsets onto calendar days.
//!
//! One time unit is one day. Start dates round down, end dates round up, so
//! a fractional activity is shown covering every day it touches.

use chrono::{Duration, NaiveDate};

#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::error::NetworkError;
use crate::network::Network;

/// A user activity placed on the calendar.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledActivity {
    pub reference: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: f64,
}

fn offset_date(origin: NaiveDate, days: f64) -> Option<NaiveDate> {
    if !days.is_finite() {
        return None;
    }
    origin.checked_add_signed(Duration::try_days(days as i64)?)
}

impl Network {
    /// Place every user activity on the calendar starting at `project_start`.
    ///
    /// Uses each activity's current start mode and duration mode.
    pub fn calendar(&self, project_start: NaiveDate) -> Result<Vec<ScheduledActivity>, NetworkError> {
        let analysis = self.analysis();
        self.user_activities()
            .map(|(id, activity)| -> Result<ScheduledActivity, NetworkError> {
                let start = analysis.start(id);
                let finish = analysis.finish(id);
                let out_of_range = || {
                    NetworkError::InvalidConfiguration(format!(
                        "activity {} can not be placed on the calendar",
                        activity.reference()
                    ))
                };
                Ok(ScheduledActivity {
                    reference: activity.reference().to_string(),
                    start_date: offset_date(project_start, start.floor()).ok_or_else(out_of_range)?,
                    end_date: offset_date(project_start, finish.ceil()).ok_or_else(out_of_range)?,
                    duration: activity.duration(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_projection() {
        let mut network = Network::new();
        network
            .add(Activity::new("a1").unwrap().with_expected_duration(1.0))
            .unwrap();
        network
            .add(Activity::new("a2").unwrap().with_expected_duration(2.5))
            .unwrap();
        network.connect("a1", ["a2"]).unwrap();
        network.fix_connections().unwrap();

        let calendar = network.calendar(date(2025, 1, 6)).unwrap();
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar[0].reference, "a1");
        assert_eq!(calendar[0].start_date, date(2025, 1, 6));
        assert_eq!(calendar[0].end_date, date(2025, 1, 7));
        assert_eq!(calendar[1].start_date, date(2025, 1, 7));
        // 1 + 2.5 = 3.5 rounds up to day 4
        assert_eq!(calendar[1].end_date, date(2025, 1, 10));
        assert_eq!(calendar[1].duration, 2.5);
    }

    #[test]
    fn test_calendar_rejects_unrepresentable_dates() {
        let mut network = Network::new();
        network
            .add(Activity::new("a1").unwrap().with_expected_duration(f64::INFINITY))
            .unwrap();
        network.fix_connections().unwrap();
        assert!(matches!(
            network.calendar(date(2025, 1, 1)),
            Err(NetworkError::InvalidConfiguration(_))
        ));
    }
}
