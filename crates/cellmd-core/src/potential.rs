//! Pairwise interaction potentials.

/// Energy and force of one pair at separation `r`.
///
/// The force on particle `i` from `j` is `force_over_r * (r_i - r_j)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairTerm {
    pub energy: f64,
    pub force_over_r: f64,
}

/// A short-range pair potential evaluated inside the cutoff only.
pub trait PairPotential: Sync {
    /// Evaluate at squared separation `r2 > 0`.
    fn evaluate(&self, r2: f64) -> PairTerm;
}

/// 12-6 Lennard-Jones: `U(r) = 4ε[(σ/r)^12 - (σ/r)^6] - shift`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LennardJones {
    pub epsilon: f64,
    pub sigma: f64,
    /// Constant subtracted from the energy; forces are unaffected.
    pub shift: f64,
}

impl Default for LennardJones {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64) -> Self {
        Self {
            epsilon,
            sigma,
            shift: 0.0,
        }
    }

    /// Shift the energy so it reaches zero at `cutoff`.
    pub fn with_shift(mut self, cutoff: f64) -> Self {
        self.shift = 0.0;
        self.shift = self.evaluate(cutoff * cutoff).energy;
        self
    }
}

impl PairPotential for LennardJones {
    #[inline]
    fn evaluate(&self, r2: f64) -> PairTerm {
        let sr2 = self.sigma * self.sigma / r2;
        let sr6 = sr2 * sr2 * sr2;
        let sr12 = sr6 * sr6;
        PairTerm {
            energy: 4.0 * self.epsilon * (sr12 - sr6) - self.shift,
            force_over_r: 24.0 * self.epsilon * (2.0 * sr12 - sr6) / r2,
        }
    }
}

/// Screened Coulomb (Yukawa): `U(r) = A exp(-κr) / r`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Yukawa {
    pub prefactor: f64,
    pub kappa: f64,
}

impl PairPotential for Yukawa {
    #[inline]
    fn evaluate(&self, r2: f64) -> PairTerm {
        let r = r2.sqrt();
        let screened = self.prefactor * (-self.kappa * r).exp() / r;
        PairTerm {
            energy: screened,
            force_over_r: screened * (1.0 + self.kappa * r) / r2,
        }
    }
}
