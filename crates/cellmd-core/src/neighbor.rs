#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cell::CellGrid;
use crate::context::ComputeContext;
use crate::error::{CellMdError, Result};
use crate::occupancy::Assignment;
use crate::occupancy_matrix::OccupancyMatrix;
use crate::reduce;

/// Padding for row slots past a particle's candidate count.
pub const UNUSED: u32 = u32::MAX;

/// Neighbor matrix W: one fixed-width row of candidate ids per particle plus
/// the number of valid entries in that row.
///
/// Candidates are every other particle in the 3x3x3 cell block around the
/// particle's own cell. The row width is the largest candidate count of the
/// step, which is at most 26 when each cell holds one particle and at most
/// `27 * max_layers - 1` in general. Slots past the count always hold
/// [`UNUSED`], never ids left over from an earlier step.
#[derive(Default)]
pub struct NeighborMatrix {
    width: usize,
    counts: Vec<u32>,
    entries: Vec<u32>,
    /// Per-cell candidate count, kept between steps like the rows.
    reach: Vec<u32>,
}

impl NeighborMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(
        &mut self,
        ctx: &ComputeContext,
        grid: &CellGrid,
        assignment: &Assignment,
        h: &OccupancyMatrix,
    ) -> Result<()> {
        let n = assignment.num_particles();
        let reach = &mut self.reach;
        let width = ctx.install(|| {
            candidate_reach(grid, assignment, reach);
            reduce::max_u32(reach)
        }) as usize;
        let len = n.checked_mul(width).ok_or(CellMdError::Allocation {
            what: "neighbor matrix",
            len: usize::MAX,
        })?;

        if len > self.entries.len() {
            self.entries
                .try_reserve_exact(len - self.entries.len())
                .map_err(|_| CellMdError::Allocation {
                    what: "neighbor matrix",
                    len,
                })?;
        }
        self.entries.resize(len, UNUSED);
        self.counts.resize(n, 0);
        self.width = width;

        if width == 0 {
            self.counts.fill(0);
            return Ok(());
        }

        let entries = &mut self.entries;
        let counts = &mut self.counts;
        ctx.install(|| {
            #[cfg(feature = "parallel")]
            {
                entries
                    .par_chunks_mut(width)
                    .zip(counts.par_iter_mut())
                    .enumerate()
                    .for_each(|(i, (row, count))| *count = fill_row(grid, assignment, h, i, row));
            }

            #[cfg(not(feature = "parallel"))]
            {
                for (i, (row, count)) in entries.chunks_mut(width).zip(counts.iter_mut()).enumerate() {
                    *count = fill_row(grid, assignment, h, i, row);
                }
            }
        });

        Ok(())
    }

    /// Drop the contents and keep the allocations.
    pub fn clear(&mut self) {
        self.width = 0;
        self.counts.clear();
        self.entries.clear();
        self.reach.clear();
    }

    /// Row width shared by every particle this step.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn num_particles(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, i: usize) -> usize {
        self.counts[i] as usize
    }

    /// Valid candidates of particle `i`.
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[u32] {
        let start = i * self.width;
        &self.entries[start..start + self.counts[i] as usize]
    }

    /// Full padded row of particle `i`.
    pub fn row(&self, i: usize) -> &[u32] {
        let start = i * self.width;
        &self.entries[start..start + self.width]
    }
}

/// Candidates reachable from each cell, own particle excluded, written into
/// `reach` (resized to the cell count).
fn candidate_reach(grid: &CellGrid, assignment: &Assignment, reach: &mut Vec<u32>) {
    let occupancy = &assignment.occupancy;
    reach.resize(occupancy.len(), 0);
    let count = |cell: usize| -> u32 {
        if occupancy[cell] == 0 {
            return 0;
        }
        let total: u32 = grid
            .neighbor_cells(cell as u32)
            .as_slice()
            .iter()
            .map(|&c| occupancy[c as usize])
            .sum();
        total - 1
    };

    #[cfg(feature = "parallel")]
    {
        reach.par_iter_mut().enumerate().for_each(|(cell, r)| *r = count(cell));
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (cell, r) in reach.iter_mut().enumerate() {
            *r = count(cell);
        }
    }
}

fn fill_row(grid: &CellGrid, assignment: &Assignment, h: &OccupancyMatrix, i: usize, row: &mut [u32]) -> u32 {
    let mut k = 0;
    for &cell in grid.neighbor_cells(assignment.cells[i]).as_slice() {
        for j in h.occupants(cell, assignment.occupancy[cell as usize]) {
            // the walk passes through the particle's own (cell, layer) slot
            if j as usize == i {
                continue;
            }
            row[k] = j;
            k += 1;
        }
    }
    row[k..].fill(UNUSED);
    k as u32
}
