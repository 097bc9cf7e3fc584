use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::frame_range::FrameRange;
use crate::data::provider::LeafletLabelProvider;
use crate::error::{AnalysisError, Result};

/// Leaflet membership of a particle in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Leaflet {
    Lower = -1,
    Midplane = 0,
    Upper = 1,
}

impl Leaflet {
    #[inline]
    pub fn as_i8(self) -> i8 {
        self as i8
    }

    #[inline]
    pub fn is_midplane(self) -> bool {
        self == Leaflet::Midplane
    }

    /// The other bilayer leaflet; the midplane has none.
    pub fn opposite(self) -> Option<Leaflet> {
        match self {
            Leaflet::Lower => Some(Leaflet::Upper),
            Leaflet::Upper => Some(Leaflet::Lower),
            Leaflet::Midplane => None,
        }
    }
}

impl TryFrom<i8> for Leaflet {
    type Error = AnalysisError;

    fn try_from(value: i8) -> Result<Self> {
        match value {
            -1 => Ok(Leaflet::Lower),
            0 => Ok(Leaflet::Midplane),
            1 => Ok(Leaflet::Upper),
            other => Err(AnalysisError::inconsistent(format!(
                "leaflet label must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<Leaflet> for i8 {
    fn from(leaflet: Leaflet) -> Self {
        leaflet.as_i8()
    }
}

impl fmt::Display for Leaflet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Leaflet::Lower => "lower",
            Leaflet::Midplane => "midplane",
            Leaflet::Upper => "upper",
        };
        write!(f, "{}", name)
    }
}

/// Per-particle leaflet label series over the analyzed frames.
///
/// Row-major by particle so each particle's series is a contiguous slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafletSeries {
    n_particles: usize,
    n_frames: usize,
    labels: Vec<Leaflet>,
}

impl LeafletSeries {
    pub fn new(n_particles: usize, n_frames: usize, labels: Vec<Leaflet>) -> Result<Self> {
        if labels.len() != n_particles * n_frames {
            return Err(AnalysisError::inconsistent(format!(
                "leaflet series holds {} labels, expected {} particles x {} frames",
                labels.len(),
                n_particles,
                n_frames
            )));
        }
        Ok(LeafletSeries { n_particles, n_frames, labels })
    }

    /// Builds a series from one row of raw `-1/0/1` labels per particle.
    pub fn from_rows(rows: &[Vec<i8>]) -> Result<Self> {
        let n_frames = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut labels = Vec::with_capacity(rows.len() * n_frames);
        for (particle, row) in rows.iter().enumerate() {
            if row.len() != n_frames {
                return Err(AnalysisError::inconsistent(format!(
                    "particle {} has {} labels, expected {}",
                    particle,
                    row.len(),
                    n_frames
                )));
            }
            for &value in row {
                labels.push(Leaflet::try_from(value)?);
            }
        }
        LeafletSeries::new(rows.len(), n_frames, labels)
    }

    /// Samples `provider` at every frame of `range`.
    pub fn from_provider<P: LeafletLabelProvider + ?Sized>(provider: &P, range: &FrameRange) -> Result<Self> {
        range.validate()?;
        range.check_within(provider.n_frames())?;
        let n_particles = provider.n_particles();
        let frames = range.frames();
        let mut labels = Vec::with_capacity(n_particles * frames.len());
        for particle in 0..n_particles {
            for &frame in &frames {
                labels.push(provider.leaflet_label(particle, frame));
            }
        }
        LeafletSeries::new(n_particles, frames.len(), labels)
    }

    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    #[inline]
    pub fn particle(&self, particle: usize) -> &[Leaflet] {
        let start = particle * self.n_frames;
        &self.labels[start..start + self.n_frames]
    }

    #[inline]
    pub fn label(&self, particle: usize, position: usize) -> Leaflet {
        self.labels[particle * self.n_frames + position]
    }
}
