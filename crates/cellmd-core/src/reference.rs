//! All-pairs O(N^2) evaluation for validating the cell-list pipeline.
//!
//! Same conventions as the pipeline: `r < cutoff`, minimum image under a
//! periodic boundary, pair energy attributed to the smaller id.

use glam::DVec3;

use crate::cell::CellGrid;
use crate::potential::PairPotential;

pub struct ReferenceResult {
    pub forces: Vec<DVec3>,
    pub energies: Vec<f64>,
    pub total_energy: f64,
    pub pairs_in_range: usize,
}

pub fn all_pairs<P: PairPotential>(
    grid: &CellGrid,
    positions: &[DVec3],
    cutoff: f64,
    potential: &P,
) -> ReferenceResult {
    let n = positions.len();
    let cutoff2 = cutoff * cutoff;
    let mut forces = vec![DVec3::ZERO; n];
    let mut energies = vec![0.0; n];
    let mut pairs_in_range = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            let d = grid.separation(positions[i], positions[j]);
            let r2 = d.length_squared();
            if r2 >= cutoff2 {
                continue;
            }
            let term = potential.evaluate(r2);
            // Newton's third law
            forces[i] += d * term.force_over_r;
            forces[j] -= d * term.force_over_r;
            energies[i] += term.energy;
            pairs_in_range += 1;
        }
    }

    let total_energy = energies.iter().sum();
    ReferenceResult {
        forces,
        energies,
        total_energy,
        pairs_in_range,
    }
}
