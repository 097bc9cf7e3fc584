use std::path::Path;

use lipcore::data::frame_range::FrameRange;
use lipcore::error::{AnalysisError, Result as CoreResult};
use lipcore::flipflop::detector::FlipFlopConfig;
use lipcore::geometry::periodic::PeriodicMode;
use lipcore::neighbours::adjacency::{AdjacencyConfig, AdjacencyMethod};
use serde::{Deserialize, Serialize};

use crate::data::io::read_json;
use crate::error::Result;

/// Settings shared by the neighbour and flip-flop drivers.
///
/// Both drivers apply the same `start/stop/step` frame selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Neighbour distance cutoff, same length unit as the coordinates
    pub cutoff: f64,
    #[serde(default)]
    pub periodic: PeriodicMode,
    #[serde(default)]
    pub method: AdjacencyMethod,
    /// Minimum residency in the new leaflet, in analyzed frames
    #[serde(default = "default_frame_cutoff")]
    pub frame_cutoff: usize,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub stop: Option<usize>,
    #[serde(default)]
    pub step: Option<usize>,
    /// Worker threads; 0 lets rayon decide
    #[serde(default)]
    pub num_threads: usize,
}

fn default_frame_cutoff() -> usize {
    FlipFlopConfig::default().frame_cutoff
}

impl AnalysisConfig {
    pub fn new(cutoff: f64) -> Self {
        AnalysisConfig {
            cutoff,
            periodic: PeriodicMode::default(),
            method: AdjacencyMethod::default(),
            frame_cutoff: default_frame_cutoff(),
            start: None,
            stop: None,
            step: None,
            num_threads: 0,
        }
    }

    pub fn with_frames(mut self, start: Option<usize>, stop: Option<usize>, step: Option<usize>) -> Self {
        self.start = start;
        self.stop = stop;
        self.step = step;
        self
    }

    pub fn with_frame_cutoff(mut self, frame_cutoff: usize) -> Self {
        self.frame_cutoff = frame_cutoff;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn adjacency(&self) -> AdjacencyConfig {
        AdjacencyConfig::new(self.cutoff).with_periodic(self.periodic).with_method(self.method)
    }

    pub fn flipflop(&self) -> FlipFlopConfig {
        FlipFlopConfig::new(self.frame_cutoff)
    }

    /// Frame range for a trajectory of `n_frames` frames.
    pub fn frame_range(&self, n_frames: usize) -> CoreResult<FrameRange> {
        FrameRange::resolve(self.start, self.stop, self.step, n_frames)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.adjacency().validate()?;
        self.flipflop().validate()?;
        if self.step == Some(0) {
            return Err(AnalysisError::config("frame step must be at least 1"));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let config: AnalysisConfig = read_json(path)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let config = AnalysisConfig::from_json_str(r#"{"cutoff": 10.0}"#).unwrap();
        assert_eq!(config, AnalysisConfig::new(10.0));
        assert_eq!(config.frame_cutoff, 1);
        assert_eq!(config.periodic, PeriodicMode::Lateral);
        assert_eq!(config.frame_range(5).unwrap(), FrameRange::new(0, 5, 1).unwrap());
    }

    #[test]
    fn test_full_json() {
        let config = AnalysisConfig::from_json_str(
            r#"{"cutoff": 12.0, "periodic": "none", "method": "grid", "frame_cutoff": 3,
                "start": 2, "stop": 20, "step": 4, "num_threads": 2}"#,
        )
        .unwrap();
        assert_eq!(config.adjacency().method, AdjacencyMethod::Grid);
        assert_eq!(config.flipflop().frame_cutoff, 3);
        assert_eq!(config.frame_range(20).unwrap().frames(), vec![2, 6, 10, 14, 18]);
        assert!(config.frame_range(10).is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(AnalysisConfig::from_json_str(r#"{"cutoff": 0.0}"#).is_err());
        assert!(AnalysisConfig::from_json_str(r#"{"cutoff": 1.0, "frame_cutoff": 0}"#).is_err());
        assert!(AnalysisConfig::from_json_str(r#"{"cutoff": 1.0, "step": 0}"#).is_err());
        assert!(AnalysisConfig::from_json_str(r#"{"frame_cutoff": 2}"#).is_err());
    }
}
