//! Precedence networks for project scheduling (CPM/PERT).
//!
//! Activities with three-point duration estimates are connected by
//! "must finish before" edges between a start and a finish sentinel. From the
//! graph the crate derives earliest/latest start and finish times, total and
//! early float, the critical path and PERT statistics, and answers
//! time-window queries.
//!
//! ```
//! use precedence::{Activity, Network};
//!
//! let mut network = Network::new();
//! network.add(Activity::new("a1")?.with_expected_duration(1.0))?;
//! network.add(Activity::new("a2")?.with_expected_duration(2.0))?;
//! network.add(Activity::new("a3")?.with_expected_duration(3.0))?;
//! network.connect("a1", ["a2", "a3"])?;
//! network.fix_connections()?;
//!
//! assert_eq!(network.finish(), 4.0);
//! let a2 = network.id("a2").unwrap();
//! assert_eq!(network.total_float(a2), 1.0);
//! # Ok::<(), precedence::NetworkError>(())
//! ```

// Allow clippy warning triggered by PyO3 macro expansion
#![cfg_attr(feature = "python", allow(clippy::useless_conversion))]

pub mod activity;
pub mod analysis;
pub mod calendar;
mod config;
pub mod diagram;
mod error;
mod interner;
pub mod logging;
pub mod network;
#[cfg(feature = "python")]
mod python;
pub mod window;
pub mod yaml;

pub use activity::{
    Activity, ActivityId, DurationMode, Role, StartMode, FINISH_REFERENCE, START_REFERENCE,
};
pub use analysis::{ActivityTiming, Analysis};
pub use calendar::ScheduledActivity;
pub use config::NetworkConfig;
pub use diagram::{Diagram, DiagramEdge, DiagramNode, Dot, DotOptions};
pub use error::NetworkError;
pub use network::Network;
pub use window::{TimeSteps, TimeWindow};
pub use yaml::YamlError;
