use lipcore::data::groups::ParticleGroups;
use lipcore::data::provider::FramePositionProvider;
use lipcore::error::{AnalysisError, Result};
use lipcore::geometry::periodic::{BoxDimensions, Position};
use serde::{Deserialize, Serialize};

/// Unwrapped coordinates of every particle in every frame, held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryTrajectory {
    particle_indices: Vec<usize>,
    frames: Vec<Vec<Position>>,
    boxes: Option<Vec<BoxDimensions>>,
}

impl InMemoryTrajectory {
    pub fn new(
        particle_indices: Vec<usize>,
        frames: Vec<Vec<Position>>,
        boxes: Option<Vec<BoxDimensions>>,
    ) -> Result<Self> {
        let n_particles = particle_indices.len();
        if let Some((f, frame)) = frames.iter().enumerate().find(|(_, fr)| fr.len() != n_particles) {
            return Err(AnalysisError::inconsistent(format!(
                "frame {} holds {} positions, expected {}",
                f,
                frame.len(),
                n_particles
            )));
        }
        if let Some(boxes) = &boxes {
            if boxes.len() != frames.len() {
                return Err(AnalysisError::inconsistent(format!(
                    "{} box entries for {} frames",
                    boxes.len(),
                    frames.len()
                )));
            }
            for b in boxes {
                b.validate()?;
            }
        }
        Ok(InMemoryTrajectory { particle_indices, frames, boxes })
    }

    /// Particles numbered `0..n` in frame order.
    pub fn from_frames(frames: Vec<Vec<Position>>, boxes: Option<Vec<BoxDimensions>>) -> Result<Self> {
        let n = frames.first().map(|f| f.len()).unwrap_or(0);
        InMemoryTrajectory::new((0..n).collect(), frames, boxes)
    }

    pub fn has_boxes(&self) -> bool {
        self.boxes.is_some()
    }
}

impl FramePositionProvider for InMemoryTrajectory {
    fn particle_indices(&self) -> &[usize] {
        &self.particle_indices
    }

    fn n_frames(&self) -> usize {
        self.frames.len()
    }

    fn position_of(&self, particle: usize, frame: usize) -> Position {
        self.frames[frame][particle]
    }

    fn box_dimensions(&self, frame: usize) -> Option<BoxDimensions> {
        self.boxes.as_ref().map(|b| b[frame])
    }

    fn frame_positions(&self, frame: usize) -> Vec<Position> {
        self.frames[frame].clone()
    }
}

/// On-disk layout of a trajectory: plain coordinate triples.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Topology indices; defaults to `0..n`
    #[serde(default)]
    pub particle_indices: Option<Vec<usize>>,
    /// Group label (species) per particle
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    pub frames: Vec<Vec<[f64; 3]>>,
    #[serde(default)]
    pub boxes: Option<Vec<[f64; 3]>>,
}

impl TrajectoryRecord {
    pub fn into_trajectory(self) -> Result<(InMemoryTrajectory, Option<ParticleGroups>)> {
        let n = self.frames.first().map(|f| f.len()).unwrap_or(0);
        let particle_indices = self.particle_indices.unwrap_or_else(|| (0..n).collect());
        let groups = match self.groups {
            Some(labels) if labels.len() != particle_indices.len() => {
                return Err(AnalysisError::inconsistent(format!(
                    "{} group labels for {} particles",
                    labels.len(),
                    particle_indices.len()
                )))
            }
            Some(labels) => Some(ParticleGroups::new(labels)),
            None => None,
        };
        let frames = self
            .frames
            .into_iter()
            .map(|f| f.into_iter().map(|[x, y, z]| Position::new(x, y, z)).collect())
            .collect();
        let boxes = self
            .boxes
            .map(|b| b.into_iter().map(|[lx, ly, lz]| BoxDimensions { lx, ly, lz }).collect());
        Ok((InMemoryTrajectory::new(particle_indices, frames, boxes)?, groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validation() {
        let frames = vec![vec![Position::origin(); 3], vec![Position::origin(); 2]];
        assert!(InMemoryTrajectory::from_frames(frames, None).is_err());

        let frames = vec![vec![Position::origin(); 2]; 2];
        let boxes = vec![BoxDimensions { lx: 1.0, ly: 1.0, lz: 1.0 }];
        assert!(InMemoryTrajectory::from_frames(frames, Some(boxes)).is_err());
    }

    #[test]
    fn test_provider_access() {
        let frames = vec![
            vec![Position::new(0.0, 0.0, 0.0), Position::new(1.0, 0.0, 0.0)],
            vec![Position::new(0.5, 0.0, 0.0), Position::new(2.0, 0.0, 0.0)],
        ];
        let traj = InMemoryTrajectory::new(vec![7, 9], frames, None).unwrap();
        assert_eq!(traj.n_particles(), 2);
        assert_eq!(traj.n_frames(), 2);
        assert_eq!(traj.particle_indices(), &[7, 9]);
        assert_eq!(traj.position_of(1, 1), Position::new(2.0, 0.0, 0.0));
        assert!(traj.box_dimensions(0).is_none());
    }

    #[test]
    fn test_record_conversion() {
        let record: TrajectoryRecord = serde_json::from_str(
            r#"{"groups": ["CHOL", "DPPC"],
                "frames": [[[0, 0, 0], [1, 1, 1]]],
                "boxes": [[10, 10, 10]]}"#,
        )
        .unwrap();
        let (traj, groups) = record.into_trajectory().unwrap();
        assert_eq!(traj.particle_indices(), &[0, 1]);
        assert_eq!(traj.box_dimensions(0), Some(BoxDimensions { lx: 10.0, ly: 10.0, lz: 10.0 }));
        assert_eq!(groups.unwrap().label(0), "CHOL");
    }
}
