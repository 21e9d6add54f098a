use glam::DVec3;

use crate::error::{CellMdError, Result};

/// What happens to positions outside the domain box.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BoundaryPolicy {
    /// Wrap into the box; separations use the minimum image.
    #[default]
    Periodic,
    /// Pin to the nearest edge cell; reported per step, never silent.
    Clamp,
}

/// Axis-aligned simulation box `[min, max)`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Domain {
    pub min: DVec3,
    pub max: DVec3,
}

impl Domain {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Cube `[0, side)^3`.
    pub fn cube(side: f64) -> Self {
        Self::new(DVec3::ZERO, DVec3::splat(side))
    }

    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }
}

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub domain: Domain,
    /// Pair interactions vanish at `r >= cutoff`.
    pub cutoff: f64,
    /// Requested minimum cell edge. `None` uses the cutoff itself.
    pub cell_size: Option<f64>,
    pub boundary: BoundaryPolicy,
    /// Hard cap on particles per cell; exceeding it is a tuning error.
    pub max_occupancy: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            domain: Domain::cube(10.0),
            cutoff: 2.5,
            cell_size: None,
            boundary: BoundaryPolicy::Periodic,
            max_occupancy: 64,
        }
    }
}

impl SimulationConfig {
    /// Cell edge the grid is built from: at least the cutoff, so the 3x3x3
    /// neighborhood always encloses the cutoff sphere.
    pub fn min_cell_edge(&self) -> f64 {
        self.cell_size.unwrap_or(self.cutoff)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return Err(CellMdError::config(format!(
                "cutoff must be positive and finite, got {}",
                self.cutoff
            )));
        }

        let extent = self.domain.extent();
        if !extent.is_finite() || extent.min_element() <= 0.0 {
            return Err(CellMdError::config(format!(
                "domain {:?}..{:?} is degenerate",
                self.domain.min, self.domain.max
            )));
        }

        if let Some(cell_size) = self.cell_size {
            if !cell_size.is_finite() || cell_size < self.cutoff {
                return Err(CellMdError::config(format!(
                    "cell size {cell_size} is smaller than the cutoff {}; the 27-cell neighborhood would not enclose the cutoff sphere",
                    self.cutoff
                )));
            }
        }

        if self.boundary == BoundaryPolicy::Periodic && extent.min_element() < 2.0 * self.cutoff {
            return Err(CellMdError::config(format!(
                "periodic box edge {} is shorter than twice the cutoff {}",
                extent.min_element(),
                self.cutoff
            )));
        }

        if self.max_occupancy == 0 {
            return Err(CellMdError::config("max_occupancy must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_cell_smaller_than_cutoff() {
        let config = SimulationConfig {
            cell_size: Some(1.0),
            cutoff: 2.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CellMdError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_periodic_box_shorter_than_two_cutoffs() {
        let config = SimulationConfig {
            domain: Domain::cube(4.0),
            cutoff: 2.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let clamped = SimulationConfig {
            boundary: BoundaryPolicy::Clamp,
            ..config
        };
        assert!(clamped.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_domain_and_bad_cutoff() {
        let flat = SimulationConfig {
            domain: Domain::new(DVec3::ZERO, DVec3::new(10.0, 0.0, 10.0)),
            ..Default::default()
        };
        assert!(flat.validate().is_err());

        let nan_cutoff = SimulationConfig {
            cutoff: f64::NAN,
            ..Default::default()
        };
        assert!(nan_cutoff.validate().is_err());
    }

    #[test]
    fn rejects_zero_occupancy_cap() {
        let config = SimulationConfig {
            max_occupancy: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
