use glam::DVec3;

use crate::cell::CellGrid;
use crate::config::SimulationConfig;
use crate::context::ComputeContext;
use crate::error::Result;
use crate::kernel;
use crate::neighbor::NeighborMatrix;
use crate::occupancy::{assign_all, Assignment, OccupancyCounter};
use crate::occupancy_matrix::OccupancyMatrix;
use crate::particle::ParticleSet;
use crate::potential::PairPotential;
use crate::reduce;

/// Per-step pipeline states, in order. Each phase only starts once the
/// previous one has returned.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum StepPhase {
    Init,
    Assigned,
    Sized,
    Indexed,
    Neighbored,
    Evaluated,
    Reduced,
}

/// Diagnostics for one completed step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub num_particles: usize,
    pub max_layers: u32,
    pub neighbor_width: usize,
    /// Interacting pairs (`r < cutoff`), each counted once.
    pub pairs_in_range: usize,
    pub clamped: usize,
    /// Particles with a NaN or infinite coordinate.
    pub non_finite: usize,
    pub total_energy: f64,
}

/// Result of [`compute_forces`].
pub struct StepOutput {
    pub forces: Vec<DVec3>,
    pub energies: Vec<f64>,
    pub total_energy: f64,
    pub report: StepReport,
}

/// Runs the cell-list pipeline once per time-step, keeping the occupancy
/// counters and the H and W arenas alive between steps.
pub struct ForceEngine<P> {
    cutoff: f64,
    grid: CellGrid,
    potential: P,
    counter: OccupancyCounter,
    assignment: Assignment,
    h: OccupancyMatrix,
    w: NeighborMatrix,
    phase: StepPhase,
}

impl<P: PairPotential> ForceEngine<P> {
    pub fn new(config: &SimulationConfig, potential: P) -> Result<Self> {
        let grid = CellGrid::new(config)?;
        log::debug!(
            "cell grid {:?}, edge {:?}, cutoff {}, {:?} boundary",
            grid.dims(),
            grid.cell_edge(),
            config.cutoff,
            config.boundary
        );
        Ok(Self {
            cutoff: config.cutoff,
            counter: OccupancyCounter::new(grid.num_cells(), config.max_occupancy)?,
            grid,
            potential,
            assignment: Assignment::default(),
            h: OccupancyMatrix::new(),
            w: NeighborMatrix::new(),
            phase: StepPhase::Init,
        })
    }

    /// Compute forces and energies for the current positions.
    ///
    /// `force` and `energy` are cleared first, so after an error they hold
    /// zeros rather than a partial or stale result. The assignment, H and W
    /// are emptied as well and only hold data once a step gets that far.
    pub fn step(&mut self, ctx: &ComputeContext, particles: &mut ParticleSet) -> Result<StepReport> {
        let n = particles.position.len();
        particles.count = n;
        particles.force.resize(n, DVec3::ZERO);
        particles.energy.resize(n, 0.0);
        particles.reset_accumulators();
        let ParticleSet {
            position,
            force,
            energy,
            ..
        } = particles;
        self.assignment = Assignment::default();
        self.h.clear();
        self.w.clear();
        self.enter(StepPhase::Init);

        self.assignment = assign_all(ctx, &self.grid, position, &mut self.counter)?;
        self.enter(StepPhase::Assigned);

        let max_layers = self.assignment.max_layers(ctx);
        self.enter(StepPhase::Sized);

        self.h.rebuild(ctx, &self.assignment, max_layers)?;
        self.enter(StepPhase::Indexed);

        self.w.rebuild(ctx, &self.grid, &self.assignment, &self.h)?;
        self.enter(StepPhase::Neighbored);

        let pairs_in_range = kernel::evaluate(
            ctx,
            &self.grid,
            position,
            &self.w,
            self.cutoff,
            &self.potential,
            force,
            energy,
        );
        self.enter(StepPhase::Evaluated);

        // smaller-id attribution: no halving needed
        let total_energy = ctx.install(|| reduce::sum_f64(&energy[..]));
        self.enter(StepPhase::Reduced);

        let report = StepReport {
            num_particles: n,
            max_layers,
            neighbor_width: self.w.width(),
            pairs_in_range,
            clamped: self.assignment.clamped,
            non_finite: self.assignment.non_finite,
            total_energy,
        };
        log::debug!(
            "step: {} particles, max_layers {}, width {}, {} pairs, U = {:.6}",
            n,
            max_layers,
            report.neighbor_width,
            pairs_in_range,
            total_energy
        );
        Ok(report)
    }

    fn enter(&mut self, phase: StepPhase) {
        debug_assert!(phase == StepPhase::Init || phase > self.phase);
        log::trace!("phase {:?}", phase);
        self.phase = phase;
    }

    /// Last phase reached; `Reduced` after a successful step.
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn occupancy_matrix(&self) -> &OccupancyMatrix {
        &self.h
    }

    pub fn neighbor_matrix(&self) -> &NeighborMatrix {
        &self.w
    }
}

/// One-shot force evaluation for `positions`.
pub fn compute_forces<P: PairPotential>(
    ctx: &ComputeContext,
    positions: &[DVec3],
    config: &SimulationConfig,
    potential: P,
) -> Result<StepOutput> {
    let mut engine = ForceEngine::new(config, potential)?;
    let mut particles = ParticleSet::from_positions(positions.to_vec());
    let report = engine.step(ctx, &mut particles)?;
    Ok(StepOutput {
        forces: particles.force,
        energies: particles.energy,
        total_energy: report.total_energy,
        report,
    })
}
