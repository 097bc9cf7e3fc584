//! Interfaces to the collaborators that supply coordinates and leaflet labels.
//!
//! Both providers address particles by their position in a fixed ordering
//! (`0..n_particles()`), established once by topology resolution. The
//! original topology indices of that ordering are exposed through
//! `particle_indices` so that two providers can be checked against each other.

use crate::data::leaflet::Leaflet;
use crate::error::{AnalysisError, Result};
use crate::geometry::periodic::{BoxDimensions, Position};

/// Per-frame particle coordinates, already unwrapped and drift corrected.
pub trait FramePositionProvider: Sync {
    /// Topology indices of the particles, in analysis order.
    fn particle_indices(&self) -> &[usize];

    fn n_frames(&self) -> usize;

    fn position_of(&self, particle: usize, frame: usize) -> Position;

    /// Box edge lengths of `frame`; `None` switches to non-periodic distances.
    fn box_dimensions(&self, frame: usize) -> Option<BoxDimensions>;

    fn n_particles(&self) -> usize {
        self.particle_indices().len()
    }

    /// All positions of one frame in analysis order.
    fn frame_positions(&self, frame: usize) -> Vec<Position> {
        (0..self.n_particles()).map(|p| self.position_of(p, frame)).collect()
    }
}

/// Per-frame leaflet assignment.
pub trait LeafletLabelProvider: Sync {
    /// Topology indices of the particles, in analysis order.
    fn particle_indices(&self) -> &[usize];

    fn n_frames(&self) -> usize;

    fn leaflet_label(&self, particle: usize, frame: usize) -> Leaflet;

    fn n_particles(&self) -> usize {
        self.particle_indices().len()
    }
}

/// Fails unless both providers order the same particles identically.
pub fn check_same_ordering<P, L>(positions: &P, leaflets: &L) -> Result<()>
where
    P: FramePositionProvider + ?Sized,
    L: LeafletLabelProvider + ?Sized,
{
    let a = positions.particle_indices();
    let b = leaflets.particle_indices();
    if a.len() != b.len() {
        return Err(AnalysisError::inconsistent(format!(
            "position provider has {} particles, leaflet provider has {}",
            a.len(),
            b.len()
        )));
    }
    if let Some(k) = a.iter().zip(b).position(|(x, y)| x != y) {
        return Err(AnalysisError::inconsistent(format!(
            "particle ordering differs at position {}: topology index {} vs {}",
            k, a[k], b[k]
        )));
    }
    Ok(())
}
