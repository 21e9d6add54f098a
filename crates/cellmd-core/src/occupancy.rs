use std::sync::atomic::{AtomicU32, Ordering};

use glam::DVec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cell::{CellGrid, CellId};
use crate::config::BoundaryPolicy;
use crate::context::ComputeContext;
use crate::error::{CellMdError, Result};
use crate::reduce;

/// Per-cell particle counters, shared by all workers of the assignment phase.
///
/// Counters are reused from step to step; [`OccupancyCounter::reset`] sizes
/// and zeroes them before each assignment.
pub struct OccupancyCounter {
    counts: Vec<AtomicU32>,
    cap: u32,
}

impl OccupancyCounter {
    pub fn new(num_cells: usize, cap: u32) -> Result<Self> {
        let mut counter = Self {
            counts: Vec::new(),
            cap,
        };
        counter.reset(num_cells)?;
        Ok(counter)
    }

    pub fn reset(&mut self, num_cells: usize) -> Result<()> {
        if num_cells > self.counts.len() {
            self.counts
                .try_reserve_exact(num_cells - self.counts.len())
                .map_err(|_| CellMdError::Allocation {
                    what: "occupancy counters",
                    len: num_cells,
                })?;
        }
        for c in self.counts.iter_mut() {
            *c.get_mut() = 0;
        }
        self.counts.resize_with(num_cells, || AtomicU32::new(0));
        Ok(())
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Claim the next layer of `cell`. Layers are 1-based and unique per cell
    /// for the current step, whatever the order workers arrive in.
    #[inline]
    pub fn assign(&self, cell: CellId) -> Result<u32> {
        let layer = self.counts[cell as usize].fetch_add(1, Ordering::Relaxed) + 1;
        if layer > self.cap {
            return Err(CellMdError::OccupancyOverflow {
                cell,
                occupancy: layer,
                cap: self.cap,
            });
        }
        Ok(layer)
    }

    /// Current counter values. Only meaningful after the assignment barrier.
    pub fn snapshot(&self) -> Vec<u32> {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}

/// Result of the assignment phase: every particle's cell and layer plus the
/// final per-cell occupancy.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    pub cells: Vec<CellId>,
    /// 1-based rank within the particle's cell.
    pub layers: Vec<u32>,
    /// Final counter value per cell.
    pub occupancy: Vec<u32>,
    /// Particles outside the box that were pinned to an edge cell.
    pub clamped: usize,
    /// Particles with a NaN or infinite coordinate, placed in cell 0.
    pub non_finite: usize,
}

impl Assignment {
    pub fn num_particles(&self) -> usize {
        self.cells.len()
    }

    /// Largest occupancy over all cells; 0 when there are no particles.
    pub fn max_layers(&self, ctx: &ComputeContext) -> u32 {
        ctx.install(|| reduce::max_u32(&self.occupancy))
    }
}

/// Assign every particle to its cell and claim a layer for it.
pub fn assign_all(
    ctx: &ComputeContext,
    grid: &CellGrid,
    positions: &[DVec3],
    counter: &mut OccupancyCounter,
) -> Result<Assignment> {
    let n = positions.len();
    if n >= u32::MAX as usize {
        return Err(CellMdError::TooManyParticles(n));
    }

    counter.reset(grid.num_cells())?;
    let counter = &*counter;

    let mut cells = vec![0 as CellId; n];
    let mut layers = vec![0u32; n];

    let (clamped, non_finite) = ctx.install(|| -> Result<(usize, usize)> {
        #[cfg(feature = "parallel")]
        {
            cells
                .par_iter_mut()
                .zip(layers.par_iter_mut())
                .zip(positions.par_iter())
                .try_for_each(|((cell, layer), &pos)| {
                    *cell = grid.cell_of(pos);
                    *layer = counter.assign(*cell)?;
                    Ok(())
                })?;

            let non_finite = positions.par_iter().filter(|p| !p.is_finite()).count();
            let clamped = match grid.boundary() {
                BoundaryPolicy::Clamp => positions
                    .par_iter()
                    .filter(|&&p| p.is_finite() && !grid.is_inside(p))
                    .count(),
                BoundaryPolicy::Periodic => 0,
            };
            Ok((clamped, non_finite))
        }

        #[cfg(not(feature = "parallel"))]
        {
            for i in 0..n {
                cells[i] = grid.cell_of(positions[i]);
                layers[i] = counter.assign(cells[i])?;
            }

            let non_finite = positions.iter().filter(|p| !p.is_finite()).count();
            let clamped = match grid.boundary() {
                BoundaryPolicy::Clamp => positions
                    .iter()
                    .filter(|&&p| p.is_finite() && !grid.is_inside(p))
                    .count(),
                BoundaryPolicy::Periodic => 0,
            };
            Ok((clamped, non_finite))
        }
    })?;

    if clamped > 0 {
        log::warn!("{clamped} of {n} particles lie outside the domain and were clamped to edge cells");
    }
    if non_finite > 0 {
        log::warn!("{non_finite} of {n} particles have non-finite coordinates and were placed in cell 0");
    }

    Ok(Assignment {
        cells,
        layers,
        occupancy: counter.snapshot(),
        clamped,
        non_finite,
    })
}
