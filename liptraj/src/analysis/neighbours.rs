//! Builds the neighbour store of a trajectory, one frame per rayon task.

use lipcore::data::groups::ParticleSelection;
use lipcore::data::provider::FramePositionProvider;
use lipcore::error::{AnalysisError, Result as CoreResult};
use lipcore::neighbours::adjacency::{AdjacencyBuilder, AdjacencyRelation};
use lipcore::neighbours::store::NeighbourStore;
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::analysis::config::AnalysisConfig;
use crate::error::{at_frame, Result};

pub struct NeighbourAnalysis {
    config: AnalysisConfig,
    builder: AdjacencyBuilder,
}

impl NeighbourAnalysis {
    pub fn new(config: AnalysisConfig) -> CoreResult<Self> {
        config.validate()?;
        let builder = AdjacencyBuilder::new(config.adjacency())?;
        Ok(NeighbourAnalysis { config, builder })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// An empty store covering `selection` over the configured frames of `provider`.
    ///
    /// Store particle `k` is the `k`-th selected provider particle.
    pub fn prepare<P: FramePositionProvider + ?Sized>(
        &self,
        provider: &P,
        selection: &ParticleSelection,
    ) -> CoreResult<NeighbourStore> {
        let n_particles = provider.n_particles();
        if let Some(&p) = selection.indices().iter().find(|&&p| p >= n_particles) {
            return Err(AnalysisError::inconsistent(format!(
                "selection refers to particle {} but the trajectory has {}",
                p, n_particles
            )));
        }
        let range = self.config.frame_range(provider.n_frames())?;
        let topology = provider.particle_indices();
        let particle_indices = selection.indices().iter().map(|&p| topology[p]).collect();
        NeighbourStore::new(range, particle_indices)
    }

    /// Relation of trajectory frame `frame` over the selected particles.
    pub fn frame_relation<P: FramePositionProvider + ?Sized>(
        &self,
        provider: &P,
        selection: &ParticleSelection,
        frame: usize,
    ) -> CoreResult<AdjacencyRelation> {
        let positions: Vec<_> = selection.indices().iter().map(|&p| provider.position_of(p, frame)).collect();
        let dims = provider.box_dimensions(frame);
        self.builder.build(&positions, dims.as_ref()).map_err(|e| at_frame(e, frame))
    }

    /// Computes and stores analyzed frame `position` only.
    pub fn compute_frame<P: FramePositionProvider + ?Sized>(
        &self,
        provider: &P,
        selection: &ParticleSelection,
        store: &mut NeighbourStore,
        position: usize,
    ) -> CoreResult<()> {
        let frame = store.frame_range().frame_at(position);
        let relation = self.frame_relation(provider, selection, frame)?;
        debug!("frame {}: {} neighbour pairs", frame, relation.n_edges());
        store.insert(position, relation)
    }

    /// Computes every analyzed frame on a pool of `num_threads` workers.
    pub fn run<P: FramePositionProvider + ?Sized>(
        &self,
        provider: &P,
        selection: &ParticleSelection,
    ) -> Result<NeighbourStore> {
        let store = self.prepare(provider, selection)?;
        let range = *store.frame_range();
        self.warn_on_large_cutoff(provider, range.start);

        let pool = ThreadPoolBuilder::new().num_threads(self.config.num_threads).build()?;
        let relations: Vec<AdjacencyRelation> = pool.install(|| {
            range
                .frames()
                .into_par_iter()
                .map(|frame| self.frame_relation(provider, selection, frame))
                .collect::<CoreResult<Vec<_>>>()
        })?;

        let total_edges: usize = relations.iter().map(AdjacencyRelation::n_edges).sum();
        info!(
            "neighbour analysis: {} particles x {} frames, cutoff {}, {} neighbour pairs in total",
            store.n_particles(),
            relations.len(),
            self.config.cutoff,
            total_edges
        );

        let particle_indices = store.particle_indices().to_vec();
        Ok(NeighbourStore::from_relations(range, particle_indices, relations)?)
    }

    fn warn_on_large_cutoff<P: FramePositionProvider + ?Sized>(&self, provider: &P, frame: usize) {
        let Some(dims) = provider.box_dimensions(frame) else {
            return;
        };
        let lateral = dims.lx.min(dims.ly);
        if self.config.cutoff > 0.5 * lateral {
            warn!(
                "cutoff {} exceeds half the lateral box length {}; minimum image distances may hide neighbours",
                self.config.cutoff, lateral
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipcore::data::groups::ParticleGroups;
    use lipcore::data::mask::InclusionMask;
    use lipcore::geometry::periodic::{BoxDimensions, Position};
    use lipcore::neighbours::count::count_neighbours;

    use crate::data::trajectory::InMemoryTrajectory;

    fn trajectory() -> InMemoryTrajectory {
        // frame 0: 0-1 close, 2 near 3 across the x boundary; frame 1: all apart; frame 2: chain 0-1-2
        let frames = vec![
            vec![
                Position::new(1.0, 1.0, 0.0),
                Position::new(2.0, 1.0, 0.0),
                Position::new(0.2, 5.0, 0.0),
                Position::new(9.9, 5.0, 0.0),
            ],
            vec![
                Position::new(1.0, 1.0, 0.0),
                Position::new(4.0, 1.0, 0.0),
                Position::new(7.0, 1.0, 0.0),
                Position::new(5.0, 6.0, 0.0),
            ],
            vec![
                Position::new(1.0, 1.0, 0.0),
                Position::new(2.0, 1.0, 0.0),
                Position::new(3.0, 1.0, 0.0),
                Position::new(5.0, 6.0, 0.0),
            ],
        ];
        let boxes = vec![BoxDimensions { lx: 10.0, ly: 10.0, lz: 10.0 }; 3];
        InMemoryTrajectory::new(vec![20, 21, 22, 23], frames, Some(boxes)).unwrap()
    }

    #[test]
    fn test_run_all_frames() {
        let analysis = NeighbourAnalysis::new(AnalysisConfig::new(1.5).with_num_threads(2)).unwrap();
        let store = analysis.run(&trajectory(), &ParticleSelection::all(4)).unwrap();
        assert_eq!(store.n_frames(), 3);
        assert_eq!(store.particle_indices(), &[20, 21, 22, 23]);
        assert!(store.relation_at(0).unwrap().contains(2, 3));

        let largest = store.largest_cluster(&ParticleSelection::all(4), None, true).unwrap();
        assert_eq!(largest.sizes, vec![2, 1, 3]);
        assert_eq!(largest.indices.unwrap()[0], vec![0, 1]);
    }

    #[test]
    fn test_selection_and_step() {
        let config = AnalysisConfig::new(1.5).with_frames(None, None, Some(2));
        let analysis = NeighbourAnalysis::new(config).unwrap();
        let selection = ParticleSelection::new(vec![1, 2, 3]);
        let store = analysis.run(&trajectory(), &selection).unwrap();
        assert_eq!(store.frame_range().frames(), vec![0, 2]);
        assert_eq!(store.particle_indices(), &[21, 22, 23]);
        // frame 2: selected particles 0 and 1 (topology 21, 22) touch
        assert!(store.relation_for_frame(2).unwrap().contains(0, 1));

        let mut mask = InclusionMask::all(3, 2);
        mask.set(0, 1, false);
        let largest = store.largest_cluster(&ParticleSelection::all(3), Some(&mask), false).unwrap();
        assert_eq!(largest.sizes, vec![2, 1]);
    }

    #[test]
    fn test_incremental_frames() {
        let analysis = NeighbourAnalysis::new(AnalysisConfig::new(1.5)).unwrap();
        let traj = trajectory();
        let selection = ParticleSelection::all(4);
        let mut store = analysis.prepare(&traj, &selection).unwrap();
        analysis.compute_frame(&traj, &selection, &mut store, 1).unwrap();

        assert!(matches!(store.relation_at(0), Err(AnalysisError::NotComputed { position: 0, frame: 0 })));
        assert_eq!(store.relation_at(1).unwrap().n_edges(), 0);

        let groups = ParticleGroups::new(["A", "A", "B", "B"]);
        assert!(count_neighbours(&store, &groups).is_err());
    }

    #[test]
    fn test_rejects_bad_selection() {
        let analysis = NeighbourAnalysis::new(AnalysisConfig::new(1.5)).unwrap();
        let err = analysis.run(&trajectory(), &ParticleSelection::new(vec![0])).unwrap_err();
        assert!(err.analysis().unwrap().is_configuration());

        let err = analysis.run(&trajectory(), &ParticleSelection::new(vec![0, 9])).unwrap_err();
        assert!(matches!(err.analysis(), Some(AnalysisError::InconsistentInput(_))));
    }
}
