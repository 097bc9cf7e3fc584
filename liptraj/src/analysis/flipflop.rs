//! Runs the flip-flop detector over a leaflet provider.

use lipcore::data::leaflet::LeafletSeries;
use lipcore::data::provider::{check_same_ordering, FramePositionProvider, LeafletLabelProvider};
use lipcore::error::{AnalysisError, Result as CoreResult};
use lipcore::flipflop::detector::{FlipFlopDetector, FlipFlopEvents};
use rayon::ThreadPoolBuilder;

use crate::analysis::config::AnalysisConfig;
use crate::error::Result;

pub struct FlipFlopAnalysis {
    config: AnalysisConfig,
    detector: FlipFlopDetector,
}

impl FlipFlopAnalysis {
    pub fn new(config: AnalysisConfig) -> CoreResult<Self> {
        config.validate()?;
        let detector = FlipFlopDetector::new(config.flipflop())?;
        Ok(FlipFlopAnalysis { config, detector })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Detects flip-flops of every particle over the configured frames.
    ///
    /// Events carry trajectory frame numbers and particle indices in the
    /// provider's order.
    pub fn run<L: LeafletLabelProvider + ?Sized>(&self, leaflets: &L) -> Result<FlipFlopEvents> {
        if leaflets.n_particles() == 0 {
            return Err(AnalysisError::config("flip-flop analysis needs at least 1 particle, got 0").into());
        }
        let range = self.config.frame_range(leaflets.n_frames())?;
        let series = LeafletSeries::from_provider(leaflets, &range)?;
        let pool = ThreadPoolBuilder::new().num_threads(self.config.num_threads).build()?;
        Ok(pool.install(|| self.detector.run(&series, &range))?)
    }

    /// As `run`, after checking that `leaflets` describes the same particles and
    /// frames as `positions`.
    pub fn run_checked<P, L>(&self, positions: &P, leaflets: &L) -> Result<FlipFlopEvents>
    where
        P: FramePositionProvider + ?Sized,
        L: LeafletLabelProvider + ?Sized,
    {
        check_same_ordering(positions, leaflets)?;
        if positions.n_frames() != leaflets.n_frames() {
            return Err(AnalysisError::inconsistent(format!(
                "position provider has {} frames, leaflet provider has {}",
                positions.n_frames(),
                leaflets.n_frames()
            ))
            .into());
        }
        self.run(leaflets)
    }
}
