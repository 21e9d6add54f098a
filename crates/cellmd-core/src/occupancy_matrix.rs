use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cell::CellId;
use crate::context::ComputeContext;
use crate::error::{CellMdError, Result};
use crate::occupancy::Assignment;

/// Marks a (cell, layer) slot with no particle.
pub const EMPTY: u32 = u32::MAX;

/// Cell-layer occupancy matrix H: `num_cells` rows of `max_layers` slots,
/// `H[c][l]` holding the id of the particle on layer `l` of cell `c`.
///
/// Storage is an arena kept across steps; [`OccupancyMatrix::rebuild`] resizes
/// it to the step's `max_layers` and clears every slot before scattering.
/// Each particle owns exactly one slot, so the scatter needs no locking.
#[derive(Default)]
pub struct OccupancyMatrix {
    num_cells: usize,
    max_layers: usize,
    slots: Vec<AtomicU32>,
}

impl OccupancyMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, ctx: &ComputeContext, assignment: &Assignment, max_layers: u32) -> Result<()> {
        let num_cells = assignment.occupancy.len();
        let max_layers = max_layers as usize;
        let len = num_cells.checked_mul(max_layers).ok_or(CellMdError::Allocation {
            what: "occupancy matrix",
            len: usize::MAX,
        })?;

        if len > self.slots.len() {
            self.slots
                .try_reserve_exact(len - self.slots.len())
                .map_err(|_| CellMdError::Allocation {
                    what: "occupancy matrix",
                    len,
                })?;
        }
        self.slots.truncate(len);
        self.slots.resize_with(len, || AtomicU32::new(EMPTY));
        self.num_cells = num_cells;
        self.max_layers = max_layers;

        let slots = &mut self.slots;
        ctx.install(|| {
            #[cfg(feature = "parallel")]
            {
                slots.par_iter_mut().for_each(|s| *s.get_mut() = EMPTY);
                let slots = &*slots;
                assignment
                    .cells
                    .par_iter()
                    .zip(assignment.layers.par_iter())
                    .enumerate()
                    .for_each(|(id, (&cell, &layer))| {
                        slots[slot_index(cell, layer, max_layers)].store(id as u32, Ordering::Relaxed);
                    });
            }

            #[cfg(not(feature = "parallel"))]
            {
                for s in slots.iter_mut() {
                    *s.get_mut() = EMPTY;
                }
                for (id, (&cell, &layer)) in assignment.cells.iter().zip(&assignment.layers).enumerate() {
                    *slots[slot_index(cell, layer, max_layers)].get_mut() = id as u32;
                }
            }
        });

        Ok(())
    }

    /// Drop the contents and keep the allocation.
    pub fn clear(&mut self) {
        self.num_cells = 0;
        self.max_layers = 0;
        self.slots.clear();
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn max_layers(&self) -> usize {
        self.max_layers
    }

    /// Particle on 1-based `layer` of `cell`, or [`EMPTY`].
    #[inline]
    pub fn get(&self, cell: CellId, layer: u32) -> u32 {
        if layer == 0 || layer as usize > self.max_layers {
            return EMPTY;
        }
        self.slots[slot_index(cell, layer, self.max_layers)].load(Ordering::Relaxed)
    }

    /// The first `occupancy` slots of `cell`'s row.
    pub fn occupants(&self, cell: CellId, occupancy: u32) -> impl Iterator<Item = u32> + '_ {
        let start = cell as usize * self.max_layers;
        self.slots[start..start + occupancy as usize]
            .iter()
            .map(|s| s.load(Ordering::Relaxed))
    }

    /// Row-major copy of the matrix.
    pub fn to_vec(&self) -> Vec<u32> {
        self.slots.iter().map(|s| s.load(Ordering::Relaxed)).collect()
    }
}

#[inline]
fn slot_index(cell: CellId, layer: u32, max_layers: usize) -> usize {
    debug_assert!(layer >= 1 && layer as usize <= max_layers);
    cell as usize * max_layers + (layer as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(cells: Vec<u32>, layers: Vec<u32>, occupancy: Vec<u32>) -> Assignment {
        Assignment {
            cells,
            layers,
            occupancy,
            ..Default::default()
        }
    }

    #[test]
    fn scatter_fills_occupied_slots_and_leaves_rest_empty() {
        let ctx = ComputeContext::new(2).unwrap();
        let a = assignment(vec![1, 1, 2], vec![1, 2, 1], vec![0, 2, 1]);
        let mut h = OccupancyMatrix::new();
        h.rebuild(&ctx, &a, 2).unwrap();

        assert_eq!(h.to_vec(), vec![EMPTY, EMPTY, 0, 1, 2, EMPTY]);
        assert_eq!(h.get(1, 2), 1);
        assert_eq!(h.get(1, 3), EMPTY);
        assert_eq!(h.occupants(1, 2).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn rebuild_clears_previous_step() {
        let ctx = ComputeContext::new(2).unwrap();
        let mut h = OccupancyMatrix::new();
        h.rebuild(&ctx, &assignment(vec![0, 0, 0], vec![1, 2, 3], vec![3, 0]), 3)
            .unwrap();
        h.rebuild(&ctx, &assignment(vec![1], vec![1], vec![0, 1]), 1).unwrap();

        assert_eq!(h.max_layers(), 1);
        assert_eq!(h.to_vec(), vec![EMPTY, 0]);
    }

    #[test]
    fn zero_layers_gives_empty_matrix() {
        let ctx = ComputeContext::new(1).unwrap();
        let mut h = OccupancyMatrix::new();
        h.rebuild(&ctx, &assignment(vec![], vec![], vec![0; 8]), 0).unwrap();
        assert!(h.to_vec().is_empty());
        assert_eq!(h.get(0, 1), EMPTY);
    }
}
