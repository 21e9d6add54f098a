use glam::DVec3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::cell::CellGrid;
use crate::context::ComputeContext;
use crate::neighbor::NeighborMatrix;
use crate::potential::PairPotential;

/// Evaluate forces and per-particle energies from the neighbor matrix.
///
/// Every particle gathers the full force from each in-range candidate, so a
/// worker only ever writes its own particle's outputs. Pair energy follows the
/// smaller-id rule: the pair `(i, j)` adds its energy to `energies[min(i, j)]`
/// only, and `energies` sums directly to the total potential energy.
///
/// A pair interacts when `r < cutoff`; a pair exactly at the cutoff does not.
/// Returns the number of interacting pairs, each counted once.
pub fn evaluate<P: PairPotential>(
    ctx: &ComputeContext,
    grid: &CellGrid,
    positions: &[DVec3],
    w: &NeighborMatrix,
    cutoff: f64,
    potential: &P,
    forces: &mut [DVec3],
    energies: &mut [f64],
) -> usize {
    let cutoff2 = cutoff * cutoff;
    let particle = |i: usize| accumulate(grid, positions, w.neighbors(i), i, cutoff2, potential);

    ctx.install(|| {
        #[cfg(feature = "parallel")]
        {
            forces
                .par_iter_mut()
                .zip(energies.par_iter_mut())
                .enumerate()
                .map(|(i, (f, u))| {
                    let (force, energy, pairs) = particle(i);
                    *f = force;
                    *u = energy;
                    pairs
                })
                .sum::<usize>()
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut total = 0;
            for (i, (f, u)) in forces.iter_mut().zip(energies.iter_mut()).enumerate() {
                let (force, energy, pairs) = particle(i);
                *f = force;
                *u = energy;
                total += pairs;
            }
            total
        }
    })
}

#[inline]
fn accumulate<P: PairPotential>(
    grid: &CellGrid,
    positions: &[DVec3],
    neighbors: &[u32],
    i: usize,
    cutoff2: f64,
    potential: &P,
) -> (DVec3, f64, usize) {
    let ri = positions[i];
    let mut force = DVec3::ZERO;
    let mut energy = 0.0;
    let mut pairs = 0;

    for &j in neighbors {
        let j = j as usize;
        if j == i {
            continue;
        }
        let d = grid.separation(ri, positions[j]);
        let r2 = d.length_squared();
        if r2 >= cutoff2 {
            continue;
        }

        let term = potential.evaluate(r2);
        force += d * term.force_over_r;
        if i < j {
            energy += term.energy;
            pairs += 1;
        }
    }

    (force, energy, pairs)
}
