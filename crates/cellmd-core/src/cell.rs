use glam::DVec3;

use crate::config::{BoundaryPolicy, SimulationConfig};
use crate::error::{CellMdError, Result};

/// Flattened cell index, `x + nx * (y + ny * z)`.
pub type CellId = u32;

/// Largest neighborhood: own cell plus 26 adjacent cells.
pub const NEIGHBORHOOD_CELLS: usize = 27;

/// Upper bound on grid size. Counters and H rows are allocated per cell, so a
/// box far larger than the cutoff is rejected up front instead of exhausting
/// memory.
pub const MAX_CELLS: usize = 1 << 27;

/// Uniform grid over the simulation box.
///
/// Every cell edge is at least the configured cell size (itself at least the
/// cutoff), so any particle within the cutoff of `p` lies in the 3x3x3 block
/// of cells around `cell_of(p)`.
#[derive(Clone, Debug)]
pub struct CellGrid {
    origin: DVec3,
    extent: DVec3,
    dims: [u32; 3],
    cell_edge: DVec3,
    inv_cell_edge: DVec3,
    boundary: BoundaryPolicy,
}

impl CellGrid {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;

        let extent = config.domain.extent();
        let per_axis = (extent / config.min_cell_edge()).floor().max(DVec3::ONE);
        let total = per_axis.x * per_axis.y * per_axis.z;
        if total > MAX_CELLS as f64 {
            return Err(CellMdError::config(format!(
                "grid of {per_axis:?} cells exceeds {MAX_CELLS} cells; increase the cell size"
            )));
        }

        let cell_edge = extent / per_axis;
        Ok(Self {
            origin: config.domain.min,
            extent,
            dims: [per_axis.x as u32, per_axis.y as u32, per_axis.z as u32],
            cell_edge,
            inv_cell_edge: cell_edge.recip(),
            boundary: config.boundary,
        })
    }

    pub fn dims(&self) -> [u32; 3] {
        self.dims
    }

    pub fn num_cells(&self) -> usize {
        self.dims.iter().map(|&n| n as usize).product()
    }

    pub fn cell_edge(&self) -> DVec3 {
        self.cell_edge
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// True when `pos` is finite and lies in `[min, max)` on every axis.
    pub fn is_inside(&self, pos: DVec3) -> bool {
        let rel = pos - self.origin;
        rel.is_finite() && rel.cmpge(DVec3::ZERO).all() && rel.cmplt(self.extent).all()
    }

    /// Integer cell coordinates. Outside positions wrap or clamp according to
    /// the boundary policy. A position with any non-finite coordinate maps to
    /// cell 0 under both policies.
    pub fn coords_of(&self, pos: DVec3) -> [u32; 3] {
        if !pos.is_finite() {
            return [0; 3];
        }
        let rel = (pos - self.origin) * self.inv_cell_edge;
        [
            self.axis_index(rel.x, self.dims[0]),
            self.axis_index(rel.y, self.dims[1]),
            self.axis_index(rel.z, self.dims[2]),
        ]
    }

    #[inline]
    fn axis_index(&self, rel: f64, n: u32) -> u32 {
        let last = (n - 1) as f64;
        let idx = match self.boundary {
            // rem_euclid can round up to exactly `n` for tiny negative inputs
            BoundaryPolicy::Periodic => rel.rem_euclid(n as f64).floor().min(last),
            BoundaryPolicy::Clamp => rel.floor().clamp(0.0, last),
        };
        idx as u32
    }

    #[inline]
    pub fn flatten(&self, [x, y, z]: [u32; 3]) -> CellId {
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    #[inline]
    pub fn unflatten(&self, cell: CellId) -> [u32; 3] {
        let [nx, ny, _] = self.dims;
        [cell % nx, (cell / nx) % ny, cell / (nx * ny)]
    }

    /// Cell containing `pos`. Pure function of position.
    #[inline]
    pub fn cell_of(&self, pos: DVec3) -> CellId {
        self.flatten(self.coords_of(pos))
    }

    /// Distinct cells of the 3x3x3 block around `cell`, the cell itself
    /// included. Periodic grids wrap; clamped grids stop at the box faces.
    pub fn neighbor_cells(&self, cell: CellId) -> NeighborCells {
        let center = self.unflatten(cell);
        let axes: [AxisSpan; 3] =
            std::array::from_fn(|a| AxisSpan::around(center[a], self.dims[a], self.boundary));

        let mut out = NeighborCells::default();
        for &z in axes[2].as_slice() {
            for &y in axes[1].as_slice() {
                for &x in axes[0].as_slice() {
                    out.push(self.flatten([x, y, z]));
                }
            }
        }
        out
    }

    /// Separation vector `a - b`, using the minimum image under `Periodic`.
    #[inline]
    pub fn separation(&self, a: DVec3, b: DVec3) -> DVec3 {
        let d = a - b;
        match self.boundary {
            BoundaryPolicy::Periodic => d - self.extent * (d / self.extent).round(),
            BoundaryPolicy::Clamp => d,
        }
    }
}

/// Up to three distinct indices along one axis.
struct AxisSpan {
    idx: [u32; 3],
    len: usize,
}

impl AxisSpan {
    fn around(c: u32, n: u32, boundary: BoundaryPolicy) -> Self {
        let mut span = Self { idx: [0; 3], len: 0 };
        for d in -1..=1_i64 {
            let i = c as i64 + d;
            let i: i64 = match boundary {
                BoundaryPolicy::Periodic => i.rem_euclid(n as i64),
                BoundaryPolicy::Clamp if i < 0 || i >= n as i64 => continue,
                BoundaryPolicy::Clamp => i,
            };
            let i = i as u32;
            // grids narrower than three cells wrap onto themselves
            if !span.as_slice().contains(&i) {
                span.idx[span.len] = i;
                span.len += 1;
            }
        }
        span
    }

    fn as_slice(&self) -> &[u32] {
        &self.idx[..self.len]
    }
}

/// Fixed-capacity list of neighborhood cells.
#[derive(Clone, Copy, Debug)]
pub struct NeighborCells {
    ids: [CellId; NEIGHBORHOOD_CELLS],
    len: usize,
}

impl Default for NeighborCells {
    fn default() -> Self {
        Self {
            ids: [0; NEIGHBORHOOD_CELLS],
            len: 0,
        }
    }
}

impl NeighborCells {
    fn push(&mut self, cell: CellId) {
        self.ids[self.len] = cell;
        self.len += 1;
    }

    pub fn as_slice(&self) -> &[CellId] {
        &self.ids[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Domain;

    fn grid(side: f64, cutoff: f64, boundary: BoundaryPolicy) -> CellGrid {
        CellGrid::new(&SimulationConfig {
            domain: Domain::cube(side),
            cutoff,
            boundary,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn dims_keep_cell_edge_at_least_cutoff() {
        let g = grid(10.0, 3.0, BoundaryPolicy::Periodic);
        assert_eq!(g.dims(), [3, 3, 3]);
        assert!(g.cell_edge().min_element() >= 3.0);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let err = CellGrid::new(&SimulationConfig {
            domain: Domain::cube(1400.0),
            cutoff: 1.0,
            boundary: BoundaryPolicy::Clamp,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CellMdError::InvalidConfig(_)), "got {err:?}");

        // 512^3 cells is exactly at the limit
        assert!(CellGrid::new(&SimulationConfig {
            domain: Domain::cube(512.0),
            cutoff: 1.0,
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn flatten_round_trips_through_unflatten() {
        let g = grid(10.0, 2.0, BoundaryPolicy::Clamp);
        for cell in 0..g.num_cells() as u32 {
            assert_eq!(g.flatten(g.unflatten(cell)), cell);
        }
    }

    #[test]
    fn periodic_wraps_and_clamp_pins() {
        let p = grid(10.0, 2.0, BoundaryPolicy::Periodic);
        assert_eq!(p.coords_of(DVec3::new(-0.5, 10.5, 4.0)), [4, 0, 2]);

        let c = grid(10.0, 2.0, BoundaryPolicy::Clamp);
        assert_eq!(c.coords_of(DVec3::new(-0.5, 10.5, 4.0)), [0, 4, 2]);
        assert!(!c.is_inside(DVec3::new(-0.5, 10.5, 4.0)));
        assert!(c.is_inside(DVec3::new(0.0, 9.99, 4.0)));
    }

    #[test]
    fn non_finite_position_maps_to_cell_zero() {
        for boundary in [BoundaryPolicy::Periodic, BoundaryPolicy::Clamp] {
            let g = grid(10.0, 2.0, boundary);
            for p in [
                DVec3::new(f64::NAN, 1.0, 1.0),
                DVec3::new(9.5, f64::INFINITY, 9.5),
                DVec3::new(9.5, 9.5, f64::NEG_INFINITY),
            ] {
                assert_eq!(g.coords_of(p), [0, 0, 0], "{boundary:?} {p:?}");
                assert_eq!(g.cell_of(p), 0);
                assert!(!g.is_inside(p));
            }
        }
    }

    #[test]
    fn neighborhood_sizes() {
        let p = grid(10.0, 2.0, BoundaryPolicy::Periodic);
        assert_eq!(p.neighbor_cells(0).len(), 27);

        let c = grid(10.0, 2.0, BoundaryPolicy::Clamp);
        assert_eq!(c.neighbor_cells(0).len(), 8);
        assert_eq!(c.neighbor_cells(c.flatten([2, 2, 2])).len(), 27);
        assert_eq!(c.neighbor_cells(c.flatten([0, 2, 2])).len(), 18);
    }

    #[test]
    fn narrow_periodic_grid_has_no_duplicate_cells() {
        // 5 / 2.5 = 2 cells per axis
        let g = grid(5.0, 2.5, BoundaryPolicy::Periodic);
        assert_eq!(g.dims(), [2, 2, 2]);
        let mut cells = g.neighbor_cells(0).as_slice().to_vec();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), 8);
    }

    #[test]
    fn separation_uses_minimum_image() {
        let p = grid(10.0, 2.0, BoundaryPolicy::Periodic);
        let d = p.separation(DVec3::new(9.5, 0.0, 0.0), DVec3::new(0.5, 0.0, 0.0));
        assert!((d.x + 1.0).abs() < 1e-12, "got {d:?}");

        let c = grid(10.0, 2.0, BoundaryPolicy::Clamp);
        let d = c.separation(DVec3::new(9.5, 0.0, 0.0), DVec3::new(0.5, 0.0, 0.0));
        assert!((d.x - 9.0).abs() < 1e-12);
    }
}
