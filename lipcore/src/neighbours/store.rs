//! Neighbour relations of every analyzed frame, and cluster queries over them.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::frame_range::FrameRange;
use crate::data::groups::ParticleSelection;
use crate::data::mask::InclusionMask;
use crate::error::{AnalysisError, Result};
use crate::neighbours::adjacency::AdjacencyRelation;
use crate::neighbours::cluster::connected_components;

/// Largest cluster of every analyzed frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargestClusters {
    /// Trajectory frame numbers, one per analyzed frame
    pub frames: Vec<usize>,
    pub sizes: Vec<usize>,
    /// Sorted member indices per frame, only when requested
    pub indices: Option<Vec<Vec<usize>>>,
}

/// One relation slot per analyzed frame, each written exactly once.
#[derive(Clone, Debug)]
pub struct NeighbourStore {
    range: FrameRange,
    particle_indices: Vec<usize>,
    relations: Vec<Option<AdjacencyRelation>>,
}

impl NeighbourStore {
    /// An empty store for the particles `particle_indices` (topology order) over `range`.
    pub fn new(range: FrameRange, particle_indices: Vec<usize>) -> Result<Self> {
        range.validate()?;
        if particle_indices.len() < 2 {
            return Err(AnalysisError::config(format!(
                "neighbour analysis needs at least 2 particles, got {}",
                particle_indices.len()
            )));
        }
        let relations = vec![None; range.len()];
        Ok(NeighbourStore { range, particle_indices, relations })
    }

    /// A store filled from one relation per analyzed frame.
    pub fn from_relations(
        range: FrameRange,
        particle_indices: Vec<usize>,
        relations: Vec<AdjacencyRelation>,
    ) -> Result<Self> {
        let mut store = NeighbourStore::new(range, particle_indices)?;
        if relations.len() != store.n_frames() {
            return Err(AnalysisError::inconsistent(format!(
                "got {} relations for {} analyzed frames",
                relations.len(),
                store.n_frames()
            )));
        }
        for (position, relation) in relations.into_iter().enumerate() {
            store.insert(position, relation)?;
        }
        Ok(store)
    }

    pub fn frame_range(&self) -> &FrameRange {
        &self.range
    }

    pub fn particle_indices(&self) -> &[usize] {
        &self.particle_indices
    }

    pub fn n_particles(&self) -> usize {
        self.particle_indices.len()
    }

    /// Number of analyzed frames.
    pub fn n_frames(&self) -> usize {
        self.relations.len()
    }

    pub fn is_computed(&self, position: usize) -> bool {
        matches!(self.relations.get(position), Some(Some(_)))
    }

    pub fn n_computed(&self) -> usize {
        self.relations.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.n_computed() == self.n_frames()
    }

    /// Positions whose relation has not been stored yet.
    pub fn missing_positions(&self) -> Vec<usize> {
        (0..self.n_frames()).filter(|&p| !self.is_computed(p)).collect()
    }

    /// Stores the relation of analyzed frame `position`.
    pub fn insert(&mut self, position: usize, relation: AdjacencyRelation) -> Result<()> {
        let n_frames = self.n_frames();
        let n_particles = self.n_particles();
        let frame = self.range.frame_at(position);
        let slot = self.relations.get_mut(position).ok_or_else(|| {
            AnalysisError::inconsistent(format!(
                "frame position {} is outside the {} analyzed frames",
                position, n_frames
            ))
        })?;
        if relation.n_particles() != n_particles {
            return Err(AnalysisError::inconsistent(format!(
                "relation for frame {} covers {} particles, store holds {}",
                frame,
                relation.n_particles(),
                n_particles
            )));
        }
        if slot.is_some() {
            return Err(AnalysisError::inconsistent(format!(
                "relation for frame position {} (frame {}) was already stored",
                position, frame
            )));
        }
        *slot = Some(relation);
        Ok(())
    }

    /// The relation stored for analyzed frame `position`.
    pub fn relation_at(&self, position: usize) -> Result<&AdjacencyRelation> {
        match self.relations.get(position) {
            Some(Some(relation)) => Ok(relation),
            Some(None) => Err(AnalysisError::not_computed(position, self.range.frame_at(position))),
            None => Err(AnalysisError::config(format!(
                "frame position {} is outside the {} analyzed frames",
                position,
                self.n_frames()
            ))),
        }
    }

    /// The relation stored for trajectory frame `frame`.
    pub fn relation_for_frame(&self, frame: usize) -> Result<&AdjacencyRelation> {
        let position = self.range.position_of(frame).ok_or_else(|| {
            AnalysisError::config(format!("frame {} is not part of the analyzed range {:?}", frame, self.range))
        })?;
        self.relation_at(position)
    }

    fn filter_flags(&self, filter: &ParticleSelection, mask: Option<&InclusionMask>) -> Result<Vec<bool>> {
        if filter.is_empty() {
            return Err(AnalysisError::config("cluster filter selects no particles"));
        }
        if let Some(mask) = mask {
            mask.check_shape(self.n_particles(), self.n_frames())?;
        }
        filter.to_flags(self.n_particles())
    }

    fn components(
        &self,
        position: usize,
        in_filter: &[bool],
        mask: Option<&InclusionMask>,
    ) -> Result<Vec<Vec<usize>>> {
        let relation = self.relation_at(position)?;
        let active: Vec<bool> = match mask {
            Some(mask) => in_filter
                .iter()
                .enumerate()
                .map(|(p, &f)| f && mask.is_included(p, position))
                .collect(),
            None => in_filter.to_vec(),
        };
        Ok(connected_components(relation, &active))
    }

    /// Every connected component of analyzed frame `position` within `filter` and `mask`.
    ///
    /// Largest first; equal sizes ordered by their lowest member.
    pub fn clusters_at(
        &self,
        position: usize,
        filter: &ParticleSelection,
        mask: Option<&InclusionMask>,
    ) -> Result<Vec<Vec<usize>>> {
        let in_filter = self.filter_flags(filter, mask)?;
        self.components(position, &in_filter, mask)
    }

    /// Size, and optionally members, of the largest cluster in every analyzed frame.
    ///
    /// Frames where nothing in `filter` survives the mask report size 0 and
    /// an empty member list.
    pub fn largest_cluster(
        &self,
        filter: &ParticleSelection,
        mask: Option<&InclusionMask>,
        return_indices: bool,
    ) -> Result<LargestClusters> {
        let in_filter = self.filter_flags(filter, mask)?;
        if let Some(&position) = self.missing_positions().first() {
            return Err(AnalysisError::not_computed(position, self.range.frame_at(position)));
        }

        let largest: Vec<Vec<usize>> = (0..self.n_frames())
            .into_par_iter()
            .map(|position| {
                self.components(position, &in_filter, mask)
                    .map(|c| c.into_iter().next().unwrap_or_default())
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "largest cluster over {} frames: max size {}",
            largest.len(),
            largest.iter().map(Vec::len).max().unwrap_or(0)
        );

        Ok(LargestClusters {
            frames: self.range.frames(),
            sizes: largest.iter().map(Vec::len).collect(),
            indices: if return_indices { Some(largest) } else { None },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::periodic::Position;
    use crate::neighbours::adjacency::{AdjacencyBuilder, AdjacencyConfig};

    fn two_frame_store() -> NeighbourStore {
        // frame 0: {0,1} and {2,3}; frame 1: chain 0-1-2, 3 alone
        let range = FrameRange::new(0, 2, 1).unwrap();
        let relations = vec![
            AdjacencyRelation::from_pairs(4, &[(0, 1), (2, 3)]).unwrap(),
            AdjacencyRelation::from_pairs(4, &[(0, 1), (1, 2)]).unwrap(),
        ];
        NeighbourStore::from_relations(range, vec![10, 11, 12, 13], relations).unwrap()
    }

    #[test]
    fn test_line_largest_cluster() {
        let builder = AdjacencyBuilder::new(AdjacencyConfig::new(6.0)).unwrap();
        let positions: Vec<Position> =
            [0.0, 5.0, 11.0].iter().map(|&x| Position::new(x, 0.0, 0.0)).collect();
        let relation = builder.build(&positions, None).unwrap();
        let store =
            NeighbourStore::from_relations(FrameRange::full(1).unwrap(), vec![0, 1, 2], vec![relation]).unwrap();

        let result = store.largest_cluster(&ParticleSelection::all(3), None, true).unwrap();
        assert_eq!(result.sizes, vec![2]);
        assert_eq!(result.indices, Some(vec![vec![0, 1]]));
    }

    #[test]
    fn test_tie_break_picks_lowest_member() {
        let store = two_frame_store();
        let result = store.largest_cluster(&ParticleSelection::all(4), None, true).unwrap();
        assert_eq!(result.frames, vec![0, 1]);
        assert_eq!(result.sizes, vec![2, 3]);
        assert_eq!(result.indices.unwrap(), vec![vec![0, 1], vec![0, 1, 2]]);

        let result = store.largest_cluster(&ParticleSelection::all(4), None, false).unwrap();
        assert!(result.indices.is_none());
    }

    #[test]
    fn test_filter_restricts_paths() {
        let store = two_frame_store();
        // without particle 1 the chain 0-1-2 falls apart
        let filter = ParticleSelection::new(vec![0, 2, 3]);
        let result = store.largest_cluster(&filter, None, true).unwrap();
        assert_eq!(result.sizes, vec![2, 1]);
        assert_eq!(result.indices.unwrap(), vec![vec![2, 3], vec![0]]);
    }

    #[test]
    fn test_mask_excluding_only_match_gives_zero() {
        let store = two_frame_store();
        let mut mask = InclusionMask::all(4, 2);
        mask.exclude_particle(3);

        let result = store
            .largest_cluster(&ParticleSelection::new(vec![3]), Some(&mask), true)
            .unwrap();
        assert_eq!(result.sizes, vec![0, 0]);
        assert_eq!(result.indices.unwrap(), vec![Vec::<usize>::new(), Vec::new()]);

        let result = store.largest_cluster(&ParticleSelection::all(4), Some(&mask), true).unwrap();
        for members in result.indices.unwrap() {
            assert!(!members.contains(&3));
        }
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let store = two_frame_store();
        let mask = InclusionMask::all(4, 3);
        assert!(matches!(
            store.largest_cluster(&ParticleSelection::all(4), Some(&mask), false),
            Err(AnalysisError::InconsistentInput(_))
        ));
    }

    #[test]
    fn test_not_computed_queries() {
        let range = FrameRange::new(100, 130, 10).unwrap();
        let mut store = NeighbourStore::new(range, vec![0, 1, 2]).unwrap();
        assert_eq!(store.relation_at(1), Err(AnalysisError::not_computed(1, 110)));
        assert!(store.relation_at(3).unwrap_err().is_configuration());

        store.insert(0, AdjacencyRelation::from_pairs(3, &[(0, 1)]).unwrap()).unwrap();
        assert!(store.relation_for_frame(100).unwrap().contains(0, 1));
        assert!(store.relation_for_frame(105).is_err());
        assert_eq!(store.missing_positions(), vec![1, 2]);
        assert_eq!(
            store.largest_cluster(&ParticleSelection::all(3), None, false),
            Err(AnalysisError::not_computed(1, 110))
        );
    }

    #[test]
    fn test_insert_is_write_once() {
        let mut store = NeighbourStore::new(FrameRange::full(1).unwrap(), vec![0, 1]).unwrap();
        store.insert(0, AdjacencyRelation::empty(2)).unwrap();
        assert!(store.insert(0, AdjacencyRelation::empty(2)).is_err());
        assert!(store.insert(1, AdjacencyRelation::empty(2)).is_err());
        assert!(store.is_complete());

        let mut store = NeighbourStore::new(FrameRange::full(1).unwrap(), vec![0, 1]).unwrap();
        assert!(store.insert(0, AdjacencyRelation::empty(3)).is_err());
        assert!(NeighbourStore::new(FrameRange::full(1).unwrap(), vec![0]).is_err());
    }

    #[test]
    fn test_clusters_at_and_empty_filter() {
        let store = two_frame_store();
        let clusters = store.clusters_at(0, &ParticleSelection::all(4), None).unwrap();
        assert_eq!(clusters, vec![vec![0, 1], vec![2, 3]]);
        assert!(store
            .largest_cluster(&ParticleSelection::default(), None, false)
            .unwrap_err()
            .is_configuration());
    }
}
