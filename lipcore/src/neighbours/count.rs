//! Neighbour counts per particle and frame, broken down by group label.

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::data::groups::ParticleGroups;
use crate::error::{AnalysisError, Result};
use crate::neighbours::store::NeighbourStore;

/// Frame-major neighbour counts: entry `(frame, particle)` of every table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighbourCounts {
    pub frames: Vec<usize>,
    /// Distinct group labels, sorted; indexes the per-label table
    pub labels: Vec<String>,
    particle_labels: Vec<usize>,
    n_particles: usize,
    totals: Vec<u32>,
    by_label: Vec<u32>,
}

impl NeighbourCounts {
    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Total neighbours of `particle` at analyzed frame `position`.
    #[inline]
    pub fn total(&self, particle: usize, position: usize) -> u32 {
        self.totals[position * self.n_particles + particle]
    }

    /// Neighbours carrying `label`, `None` if no particle has that label.
    pub fn by_label(&self, particle: usize, position: usize, label: &str) -> Option<u32> {
        let l = self.label_index(label)?;
        Some(self.by_label[(position * self.n_particles + particle) * self.labels.len() + l])
    }

    /// Label x label enrichment over all frames.
    ///
    /// Entry `[a][b]` is the mean fraction of neighbours of `a` particles that
    /// carry label `b`, divided by the fraction of all particles labelled `b`.
    /// Values above 1 mean `b` is over-represented around `a`. Particles with
    /// no neighbours in a frame do not contribute; rows without any sample are NaN.
    pub fn enrichment(&self) -> Vec<Vec<f64>> {
        let n_labels = self.labels.len();
        let mut population = vec![0usize; n_labels];
        for &l in &self.particle_labels {
            population[l] += 1;
        }

        (0..n_labels)
            .map(|a| {
                (0..n_labels)
                    .map(|b| {
                        let fractions: Vec<f64> = (0..self.n_frames())
                            .flat_map(|f| (0..self.n_particles).map(move |p| (f, p)))
                            .filter(|&(f, p)| self.particle_labels[p] == a && self.total(p, f) > 0)
                            .map(|(f, p)| {
                                let row = (f * self.n_particles + p) * n_labels;
                                self.by_label[row + b] as f64 / self.total(p, f) as f64
                            })
                            .collect();
                        let expected = population[b] as f64 / self.n_particles as f64;
                        fractions.iter().mean() / expected
                    })
                    .collect()
            })
            .collect()
    }
}

/// Counts, for every particle and analyzed frame, its neighbours in total and per label.
pub fn count_neighbours(store: &NeighbourStore, groups: &ParticleGroups) -> Result<NeighbourCounts> {
    if groups.n_particles() != store.n_particles() {
        return Err(AnalysisError::inconsistent(format!(
            "{} group labels for {} particles",
            groups.n_particles(),
            store.n_particles()
        )));
    }
    let (labels, particle_labels) = groups.label_ids();
    let n_labels = labels.len();
    let n_particles = store.n_particles();

    let per_frame: Vec<(Vec<u32>, Vec<u32>)> = (0..store.n_frames())
        .into_par_iter()
        .map(|position| -> Result<(Vec<u32>, Vec<u32>)> {
            let relation = store.relation_at(position)?;
            let mut totals = Vec::with_capacity(n_particles);
            let mut by_label = vec![0u32; n_particles * n_labels];
            for p in 0..n_particles {
                let neighbours = relation.neighbours_of(p);
                totals.push(neighbours.len() as u32);
                for &q in neighbours {
                    by_label[p * n_labels + particle_labels[q]] += 1;
                }
            }
            Ok((totals, by_label))
        })
        .collect::<Result<Vec<_>>>()?;

    let (totals, by_label): (Vec<Vec<u32>>, Vec<Vec<u32>>) = per_frame.into_iter().unzip();
    info!(
        "counted neighbours of {} particles over {} frames ({} labels)",
        n_particles,
        store.n_frames(),
        n_labels
    );

    Ok(NeighbourCounts {
        frames: store.frame_range().frames(),
        labels,
        particle_labels,
        n_particles,
        totals: totals.concat(),
        by_label: by_label.concat(),
    })
}
