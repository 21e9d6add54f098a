//! Error types for the cell-list force pipeline.

use thiserror::Error;

/// Failures a step can report.
///
/// Configuration errors are raised by [`SimulationConfig::validate`](crate::config::SimulationConfig::validate)
/// before any step runs. The remaining variants abandon the current step; no
/// partial forces are returned alongside them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellMdError {
    /// Cutoff, domain or occupancy cap cannot produce a correct neighborhood.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A cell received more particles than the configured cap allows.
    #[error("cell {cell} reached occupancy {occupancy}, above the cap of {cap}; reduce the cell size or raise max_occupancy")]
    OccupancyOverflow { cell: u32, occupancy: u32, cap: u32 },

    /// Reserving storage for H or W failed.
    #[error("failed to allocate {what} with {len} slots")]
    Allocation { what: &'static str, len: usize },

    /// Particle ids must fit below the `u32` sentinel value.
    #[error("{0} particles exceed the addressable id range")]
    TooManyParticles(usize),
}

impl CellMdError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CellMdError::InvalidConfig(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CellMdError>;
