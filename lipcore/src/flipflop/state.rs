//! Per-particle leaflet transition state machine.
//!
//! `advance` is a pure step from (state, label) to (state, event). A particle's
//! history is a left fold of `advance` over its label series; particles never
//! interact.

use serde::{Deserialize, Serialize};

use crate::data::leaflet::Leaflet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Reached the opposite leaflet and stayed for `frame_cutoff` frames
    Success,
    /// Returned to the origin leaflet first
    Fail,
}

/// A closed excursion, in analyzed-frame positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Last position resident in the origin leaflet
    pub departure: usize,
    /// Position where the new residency was confirmed, or the origin regained
    pub arrival: usize,
    pub leaflet: Leaflet,
    pub outcome: Outcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionState {
    /// Only midplane labels seen so far; no origin to leave from
    Unanchored,
    Resident(Leaflet),
    Transitioning {
        origin: Leaflet,
        departure: usize,
        candidate: Leaflet,
        candidate_since: usize,
    },
}

impl TransitionState {
    /// State after observing the first analyzed label.
    pub fn initial(label: Leaflet) -> Self {
        if label.is_midplane() {
            TransitionState::Unanchored
        } else {
            TransitionState::Resident(label)
        }
    }

    /// Consumes the label observed at `position`.
    pub fn advance(self, label: Leaflet, position: usize, frame_cutoff: usize) -> (Self, Option<Transition>) {
        match self {
            TransitionState::Unanchored => (TransitionState::initial(label), None),

            TransitionState::Resident(current) if current == label => (self, None),

            TransitionState::Resident(origin) => TransitionState::Transitioning {
                origin,
                departure: position.saturating_sub(1),
                candidate: label,
                candidate_since: position,
            }
            .confirm(position, frame_cutoff),

            TransitionState::Transitioning { origin, departure, .. } if label == origin => (
                TransitionState::Resident(origin),
                Some(Transition { departure, arrival: position, leaflet: origin, outcome: Outcome::Fail }),
            ),

            TransitionState::Transitioning { candidate, .. } if label == candidate => {
                self.confirm(position, frame_cutoff)
            }

            // new candidate; the departure from the origin stands
            TransitionState::Transitioning { origin, departure, .. } => TransitionState::Transitioning {
                origin,
                departure,
                candidate: label,
                candidate_since: position,
            }
            .confirm(position, frame_cutoff),
        }
    }

    /// Promotes a transitioning state once its candidate leaflet has been held long enough.
    fn confirm(self, position: usize, frame_cutoff: usize) -> (Self, Option<Transition>) {
        match self {
            TransitionState::Transitioning { departure, candidate, candidate_since, .. }
                if !candidate.is_midplane() && position + 1 - candidate_since >= frame_cutoff =>
            {
                (
                    TransitionState::Resident(candidate),
                    Some(Transition {
                        departure,
                        arrival: position,
                        leaflet: candidate,
                        outcome: Outcome::Success,
                    }),
                )
            }
            _ => (self, None),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self, TransitionState::Transitioning { .. })
    }
}
