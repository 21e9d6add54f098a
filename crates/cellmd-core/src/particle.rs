use glam::DVec3;

/// SoA particle storage. The id of a particle is its index.
///
/// Positions are owned by the driving integrator; a step reads them and
/// overwrites `force` and `energy` (both are reset every step).
pub struct ParticleSet {
    pub count: usize,
    pub position: Vec<DVec3>,
    /// Total short-range force on each particle.
    pub force: Vec<DVec3>,
    /// Pair energy attributed to each particle (smaller-id rule), so the
    /// entries sum to the total potential energy.
    pub energy: Vec<f64>,
}

impl ParticleSet {
    pub fn new(count: usize) -> Self {
        Self::from_positions(vec![DVec3::ZERO; count])
    }

    pub fn from_positions(position: Vec<DVec3>) -> Self {
        let count = position.len();
        Self {
            count,
            position,
            force: vec![DVec3::ZERO; count],
            energy: vec![0.0; count],
        }
    }

    /// Simple cubic lattice of `per_side^3` particles starting at `origin`.
    pub fn cubic_lattice(per_side: usize, spacing: f64, origin: DVec3) -> Self {
        let mut position = Vec::with_capacity(per_side * per_side * per_side);
        for z in 0..per_side {
            for y in 0..per_side {
                for x in 0..per_side {
                    position.push(origin + DVec3::new(x as f64, y as f64, z as f64) * spacing);
                }
            }
        }
        Self::from_positions(position)
    }

    pub fn reset_accumulators(&mut self) {
        self.force.iter_mut().for_each(|f| *f = DVec3::ZERO);
        self.energy.iter_mut().for_each(|u| *u = 0.0);
    }

    /// Forces and energies packed for a device buffer.
    pub fn force_records(&self) -> Vec<ForceRecord> {
        pack_force_records(&self.force, &self.energy)
    }
}

/// Device-side force layout: 16 bytes, `vec4<f32>` compatible.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ForceRecord {
    pub force: [f32; 3],
    pub energy: f32,
}

pub fn pack_force_records(forces: &[DVec3], energies: &[f64]) -> Vec<ForceRecord> {
    forces
        .iter()
        .zip(energies)
        .map(|(f, &u)| ForceRecord {
            force: f.as_vec3().to_array(),
            energy: u as f32,
        })
        .collect()
}

/// View packed records as raw bytes for upload.
pub fn records_as_bytes(records: &[ForceRecord]) -> &[u8] {
    bytemuck::cast_slice(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_has_per_side_cubed_particles() {
        let set = ParticleSet::cubic_lattice(3, 1.5, DVec3::splat(0.5));
        assert_eq!(set.count, 27);
        assert_eq!(set.position[0], DVec3::splat(0.5));
        assert_eq!(set.position[26], DVec3::splat(3.5));
        assert_eq!(set.force.len(), 27);
    }

    #[test]
    fn reset_clears_accumulators() {
        let mut set = ParticleSet::new(4);
        set.force[2] = DVec3::X;
        set.energy[1] = -3.0;
        set.reset_accumulators();
        assert!(set.force.iter().all(|f| *f == DVec3::ZERO));
        assert!(set.energy.iter().all(|&u| u == 0.0));
    }

    #[test]
    fn force_record_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<ForceRecord>(), 16);
        let records = pack_force_records(&[DVec3::new(1.0, -2.0, 0.5)], &[-0.25]);
        assert_eq!(records[0].force, [1.0, -2.0, 0.5]);
        assert_eq!(records[0].energy, -0.25);
        assert_eq!(records_as_bytes(&records).len(), 16);
    }
}
