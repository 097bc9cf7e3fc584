use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Analyzed frames `start, start + step, ...` below `stop`.
///
/// Stores are indexed by position in this sequence, not by trajectory frame;
/// `frame_at` and `position_of` map between the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
}

impl FrameRange {
    pub fn new(start: usize, stop: usize, step: usize) -> Result<Self> {
        let range = FrameRange { start, stop, step };
        range.validate()?;
        Ok(range)
    }

    /// Every frame of a trajectory with `n_frames` frames.
    pub fn full(n_frames: usize) -> Result<Self> {
        FrameRange::new(0, n_frames, 1)
    }

    /// Resolves optional bounds against a trajectory length, defaulting to the whole trajectory.
    pub fn resolve(
        start: Option<usize>,
        stop: Option<usize>,
        step: Option<usize>,
        n_frames: usize,
    ) -> Result<Self> {
        let range = FrameRange::new(
            start.unwrap_or(0),
            stop.unwrap_or(n_frames),
            step.unwrap_or(1),
        )?;
        range.check_within(n_frames)?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(AnalysisError::config("frame step must be at least 1"));
        }
        if self.start >= self.stop {
            return Err(AnalysisError::config(format!(
                "empty frame range: start {} is not below stop {}",
                self.start, self.stop
            )));
        }
        Ok(())
    }

    /// Fails if the range reaches past the end of a trajectory of `n_frames` frames.
    pub fn check_within(&self, n_frames: usize) -> Result<()> {
        if self.stop > n_frames {
            return Err(AnalysisError::config(format!(
                "frame range stop {} exceeds trajectory length {}",
                self.stop, n_frames
            )));
        }
        Ok(())
    }

    /// Number of analyzed frames.
    pub fn len(&self) -> usize {
        if self.step == 0 || self.start >= self.stop {
            return 0;
        }
        (self.stop - self.start).div_ceil(self.step)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Trajectory frame analyzed at `position`.
    #[inline]
    pub fn frame_at(&self, position: usize) -> usize {
        self.start + position * self.step
    }

    /// Position in the analyzed sequence of trajectory frame `frame`, if it is analyzed.
    pub fn position_of(&self, frame: usize) -> Option<usize> {
        if frame < self.start || frame >= self.stop {
            return None;
        }
        let offset = frame - self.start;
        if offset % self.step != 0 {
            return None;
        }
        Some(offset / self.step)
    }

    pub fn frames(&self) -> Vec<usize> {
        (self.start..self.stop).step_by(self.step.max(1)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_mapping() {
        let range = FrameRange::new(10, 21, 5).unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range.frames(), vec![10, 15, 20]);
        assert_eq!(range.frame_at(2), 20);
        assert_eq!(range.position_of(15), Some(1));
        assert_eq!(range.position_of(16), None);
        assert_eq!(range.position_of(25), None);
        assert_eq!(range.position_of(5), None);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(FrameRange::new(0, 10, 0).unwrap_err().is_configuration());
        assert!(FrameRange::new(5, 5, 1).is_err());
        assert!(FrameRange::resolve(None, Some(20), None, 10).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let range = FrameRange::resolve(None, None, Some(2), 7).unwrap();
        assert_eq!(range.frames(), vec![0, 2, 4, 6]);
        assert_eq!(range.len(), 4);
    }
}
