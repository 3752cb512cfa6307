//! Error types for network construction and mutation.

use thiserror::Error;

/// Errors raised while building, connecting or configuring a network.
///
/// Temporal queries never fail: they assume an acyclic graph and do not
/// report cycles (a cyclic graph recurses without bound).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Activity reference '{0}' is reserved")]
    ReservedReference(String),
    #[error("Activity {0} already exists in the network")]
    DuplicateReference(String),
    #[error("Activity with reference {0} was not found")]
    UnknownReference(String),
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
