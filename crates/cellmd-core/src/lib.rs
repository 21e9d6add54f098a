//! Linked-cell short-range force engine for molecular dynamics.
//!
//! Each step runs a fixed pipeline over the current positions:
//!
//! 1. [`cell`]: map positions to cells of a uniform grid.
//! 2. [`occupancy`]: count particles per cell with atomic counters and give
//!    every particle a unique layer within its cell.
//! 3. [`reduce`]: tree max-reduction of the counters gives `max_layers`.
//! 4. [`occupancy_matrix`]: scatter particle ids into the `cells x layers`
//!    matrix H.
//! 5. [`neighbor`]: walk the 3x3x3 cell block through H to build the
//!    per-particle candidate matrix W.
//! 6. [`kernel`]: evaluate the pair potential for candidates within the
//!    cutoff and accumulate forces and energies.
//! 7. [`reduce`]: tree sum of per-particle energies.
//!
//! [`ForceEngine`] keeps the arenas between steps; [`compute_forces`] is the
//! one-shot entry point.

pub mod cell;
pub mod config;
pub mod context;
pub mod error;
pub mod kernel;
pub mod neighbor;
pub mod occupancy;
pub mod occupancy_matrix;
pub mod particle;
pub mod pipeline;
pub mod potential;
pub mod reduce;
pub mod reference;

pub use config::{BoundaryPolicy, Domain, SimulationConfig};
pub use context::ComputeContext;
pub use error::{CellMdError, Result};
pub use particle::{ForceRecord, ParticleSet};
pub use pipeline::{compute_forces, ForceEngine, StepOutput, StepPhase, StepReport};
pub use potential::{LennardJones, PairPotential, PairTerm, Yukawa};
