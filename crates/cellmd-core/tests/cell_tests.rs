use cellmd_core::cell::CellGrid;
use cellmd_core::config::{BoundaryPolicy, Domain, SimulationConfig};
use glam::DVec3;

fn grid(boundary: BoundaryPolicy) -> CellGrid {
    CellGrid::new(&SimulationConfig {
        domain: Domain::new(DVec3::splat(-5.0), DVec3::splat(5.0)),
        cutoff: 1.0,
        boundary,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_cell_of_is_pure() {
    let g = grid(BoundaryPolicy::Periodic);
    let p = DVec3::new(0.3, -2.7, 4.1);
    assert_eq!(g.cell_of(p), g.cell_of(p));
    assert_eq!(g.cell_of(p), g.clone().cell_of(p));
}

#[test]
fn test_nearby_positions_share_or_touch_cells() {
    let g = grid(BoundaryPolicy::Clamp);

    let a = DVec3::new(0.1, 0.1, 0.1);
    let b = DVec3::new(0.2, 0.2, 0.2);
    let far = DVec3::new(4.5, 4.5, 4.5);

    assert_eq!(g.cell_of(a), g.cell_of(b), "should share a cell");
    let around = g.neighbor_cells(g.cell_of(a));
    assert!(around.as_slice().contains(&g.cell_of(a)), "should include own cell");
    assert!(
        !around.as_slice().contains(&g.cell_of(far)),
        "far cell should NOT be a neighbor"
    );
}

#[test]
fn test_negative_positions() {
    let g = grid(BoundaryPolicy::Clamp);

    let a = DVec3::new(-1.0, -1.0, -1.0);
    let b = DVec3::new(-0.9, -1.0, -1.0);
    assert_eq!(g.coords_of(a), [4, 4, 4]);
    assert_eq!(g.cell_of(a), g.cell_of(b));
    assert!(g.is_inside(DVec3::splat(-5.0)), "min corner is inside");
    assert!(!g.is_inside(DVec3::splat(5.0)), "max corner is outside");
}

#[test]
fn test_large_positions() {
    let periodic = grid(BoundaryPolicy::Periodic);
    let clamped = grid(BoundaryPolicy::Clamp);
    let p = DVec3::new(1000.25, 1000.25, 1000.25);

    // 1000.25 wraps to 0.25, inside cell 5 of 10
    assert_eq!(periodic.coords_of(p), [5, 5, 5]);
    assert_eq!(clamped.coords_of(p), [9, 9, 9]);
    assert!((periodic.cell_of(p) as usize) < periodic.num_cells());
}

#[test]
fn test_every_cell_has_itself_as_neighbor() {
    for boundary in [BoundaryPolicy::Periodic, BoundaryPolicy::Clamp] {
        let g = grid(boundary);
        for cell in 0..g.num_cells() as u32 {
            let around = g.neighbor_cells(cell);
            assert!(around.as_slice().contains(&cell));
            assert!(around.len() <= 27);

            let mut sorted = around.as_slice().to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), around.len(), "duplicate cell around {cell}");
        }
    }
}

#[test]
fn test_requested_cell_size_is_respected() {
    let g = CellGrid::new(&SimulationConfig {
        domain: Domain::cube(12.0),
        cutoff: 1.0,
        cell_size: Some(3.5),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(g.dims(), [3, 3, 3]);
    assert!(g.cell_edge().min_element() >= 3.5);
}
