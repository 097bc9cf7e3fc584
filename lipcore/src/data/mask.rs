use crate::error::{AnalysisError, Result};

/// Particles x analyzed-frames inclusion flags for clustering.
///
/// An excluded particle is absent from that frame's graph only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InclusionMask {
    n_particles: usize,
    n_frames: usize,
    included: Vec<bool>,
}

impl InclusionMask {
    pub fn new(n_particles: usize, n_frames: usize, included: Vec<bool>) -> Result<Self> {
        if included.len() != n_particles * n_frames {
            return Err(AnalysisError::inconsistent(format!(
                "mask holds {} entries, expected {} particles x {} frames",
                included.len(),
                n_particles,
                n_frames
            )));
        }
        Ok(InclusionMask { n_particles, n_frames, included })
    }

    /// Mask with every particle included at every frame.
    pub fn all(n_particles: usize, n_frames: usize) -> Self {
        InclusionMask { n_particles, n_frames, included: vec![true; n_particles * n_frames] }
    }

    /// One row of flags per particle.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let n_frames = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some((p, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_frames) {
            return Err(AnalysisError::inconsistent(format!(
                "mask row for particle {} has {} frames, expected {}",
                p,
                row.len(),
                n_frames
            )));
        }
        InclusionMask::new(rows.len(), n_frames, rows.concat())
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_particles, self.n_frames)
    }

    /// Fails unless the mask covers exactly `n_particles` x `n_frames`.
    pub fn check_shape(&self, n_particles: usize, n_frames: usize) -> Result<()> {
        if self.shape() != (n_particles, n_frames) {
            return Err(AnalysisError::inconsistent(format!(
                "mask shape {:?} does not match {} particles x {} analyzed frames",
                self.shape(),
                n_particles,
                n_frames
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn is_included(&self, particle: usize, position: usize) -> bool {
        self.included[particle * self.n_frames + position]
    }

    pub fn set(&mut self, particle: usize, position: usize, included: bool) {
        self.included[particle * self.n_frames + position] = included;
    }

    /// Removes `particle` from every frame.
    pub fn exclude_particle(&mut self, particle: usize) {
        let start = particle * self.n_frames;
        self.included[start..start + self.n_frames].fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_shape_checks() {
        let mask = InclusionMask::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        assert_eq!(mask.shape(), (2, 2));
        assert!(mask.is_included(0, 0));
        assert!(!mask.is_included(0, 1));
        assert!(mask.check_shape(2, 2).is_ok());
        assert!(mask.check_shape(3, 2).is_err());
        assert!(InclusionMask::from_rows(&[vec![true], vec![true, true]]).is_err());
    }

    #[test]
    fn test_exclude_particle() {
        let mut mask = InclusionMask::all(3, 4);
        mask.exclude_particle(1);
        assert!((0..4).all(|f| !mask.is_included(1, f)));
        assert!((0..4).all(|f| mask.is_included(2, f)));
    }
}
