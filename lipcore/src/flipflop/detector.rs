//! Flip-flop detection over whole leaflet label series.

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::data::frame_range::FrameRange;
use crate::data::leaflet::{Leaflet, LeafletSeries};
use crate::error::{AnalysisError, Result};
use crate::flipflop::state::{Outcome, Transition, TransitionState};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipFlopConfig {
    /// Consecutive frames a particle must spend in the new leaflet
    #[serde(default = "default_frame_cutoff")]
    pub frame_cutoff: usize,
}

fn default_frame_cutoff() -> usize {
    1
}

impl Default for FlipFlopConfig {
    fn default() -> Self {
        Self { frame_cutoff: default_frame_cutoff() }
    }
}

impl FlipFlopConfig {
    pub fn new(frame_cutoff: usize) -> Self {
        Self { frame_cutoff }
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_cutoff == 0 {
            return Err(AnalysisError::config("frame_cutoff must be at least 1"));
        }
        Ok(())
    }
}

/// One completed excursion, in trajectory frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipFlopEvent {
    /// Particle index in analysis order
    pub particle: usize,
    pub departure_frame: usize,
    pub arrival_frame: usize,
    /// Leaflet the particle ends up in (the origin for failed attempts)
    pub leaflet: Leaflet,
    pub outcome: Outcome,
}

impl FlipFlopEvent {
    pub fn as_tuple(&self) -> (usize, usize, usize, i8) {
        (self.particle, self.departure_frame, self.arrival_frame, self.leaflet.as_i8())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitStatistics {
    pub n: usize,
    /// Mean frames between departure and arrival of successful events
    pub mean: f64,
    pub std_dev: f64,
}

/// All events of one run, ordered by particle, then by time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlipFlopEvents {
    pub events: Vec<FlipFlopEvent>,
}

impl FlipFlopEvents {
    /// `(particle, departure_frame, arrival_frame, leaflet)` per event.
    pub fn tuples(&self) -> Vec<(usize, usize, usize, i8)> {
        self.events.iter().map(FlipFlopEvent::as_tuple).collect()
    }

    /// Outcome tags parallel to `tuples()`.
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.events.iter().map(|e| e.outcome).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn n_success(&self) -> usize {
        self.events.iter().filter(|e| e.outcome == Outcome::Success).count()
    }

    pub fn n_fail(&self) -> usize {
        self.events.iter().filter(|e| e.outcome == Outcome::Fail).count()
    }

    /// Fraction of attempts that succeeded, `None` without any attempt.
    pub fn success_rate(&self) -> Option<f64> {
        if self.events.is_empty() {
            return None;
        }
        Some(self.n_success() as f64 / self.events.len() as f64)
    }

    /// `(successes, failures)` for each of `n_particles` particles.
    pub fn per_particle(&self, n_particles: usize) -> Vec<(usize, usize)> {
        let mut counts = vec![(0, 0); n_particles];
        for e in self.events.iter().filter(|e| e.particle < n_particles) {
            match e.outcome {
                Outcome::Success => counts[e.particle].0 += 1,
                Outcome::Fail => counts[e.particle].1 += 1,
            }
        }
        counts
    }

    pub fn for_particle(&self, particle: usize) -> impl Iterator<Item = &FlipFlopEvent> {
        self.events.iter().filter(move |e| e.particle == particle)
    }

    /// Transit-time statistics of successful events, `None` if there are none.
    pub fn transit_statistics(&self) -> Option<TransitStatistics> {
        let transit: Vec<f64> = self
            .events
            .iter()
            .filter(|e| e.outcome == Outcome::Success)
            .map(|e| (e.arrival_frame - e.departure_frame) as f64)
            .collect();
        if transit.is_empty() {
            return None;
        }
        let std_dev = if transit.len() > 1 { transit.iter().std_dev() } else { 0.0 };
        Some(TransitStatistics { n: transit.len(), mean: transit.iter().mean(), std_dev })
    }
}

#[derive(Clone, Debug)]
pub struct FlipFlopDetector {
    config: FlipFlopConfig,
}

impl FlipFlopDetector {
    pub fn new(config: FlipFlopConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FlipFlopConfig {
        &self.config
    }

    /// Closed excursions of one label series, in analyzed positions.
    ///
    /// An excursion still open after the last label is dropped.
    pub fn detect(&self, labels: &[Leaflet]) -> Vec<Transition> {
        let Some((&first, rest)) = labels.split_first() else {
            return Vec::new();
        };
        let mut state = TransitionState::initial(first);
        let mut transitions = Vec::new();
        for (offset, &label) in rest.iter().enumerate() {
            let (next, event) = state.advance(label, offset + 1, self.config.frame_cutoff);
            state = next;
            transitions.extend(event);
        }
        if state.is_transitioning() {
            debug!("dropping open excursion at end of series: {:?}", state);
        }
        transitions
    }

    /// Runs every particle of `series`, sampled at the frames of `range`, in parallel.
    pub fn run(&self, series: &LeafletSeries, range: &FrameRange) -> Result<FlipFlopEvents> {
        if range.len() != series.n_frames() {
            return Err(AnalysisError::inconsistent(format!(
                "label series has {} frames but the frame range selects {}",
                series.n_frames(),
                range.len()
            )));
        }

        let per_particle: Vec<Vec<FlipFlopEvent>> = (0..series.n_particles())
            .into_par_iter()
            .map(|particle| {
                self.detect(series.particle(particle))
                    .into_iter()
                    .map(|t| FlipFlopEvent {
                        particle,
                        departure_frame: range.frame_at(t.departure),
                        arrival_frame: range.frame_at(t.arrival),
                        leaflet: t.leaflet,
                        outcome: t.outcome,
                    })
                    .collect()
            })
            .collect();

        let unanchored = (0..series.n_particles())
            .filter(|&p| series.particle(p).iter().all(|l| l.is_midplane()))
            .count();
        if unanchored > 0 {
            warn!("{} particles never left the midplane and cannot flip-flop", unanchored);
        }

        let events = FlipFlopEvents { events: per_particle.into_iter().flatten().collect() };
        info!(
            "flip-flop detection over {} particles x {} frames (frame_cutoff {}): {} success, {} fail",
            series.n_particles(),
            series.n_frames(),
            self.config.frame_cutoff,
            events.n_success(),
            events.n_fail()
        );
        Ok(events)
    }
}
