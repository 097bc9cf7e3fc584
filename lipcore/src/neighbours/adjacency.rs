//! Per-frame neighbour relation and the builder that computes it from positions.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::geometry::periodic::{BoxDimensions, Metric, PeriodicMode, Position};
use crate::geometry::spatial_grid::CellGrid;

/// Below this many particles `AdjacencyMethod::Auto` skips the grid.
pub const BRUTE_FORCE_LIMIT: usize = 64;

/// Symmetric boolean relation over particles, stored as sorted neighbour lists.
///
/// `contains(i, i)` is always false.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjacencyRelation {
    offsets: Vec<usize>,
    neighbours: Vec<usize>,
}

impl AdjacencyRelation {
    /// Builds the relation from undirected pairs; self pairs and duplicates are dropped.
    pub fn from_pairs(n_particles: usize, pairs: &[(usize, usize)]) -> Result<Self> {
        let mut degree = vec![0usize; n_particles];
        for &(i, j) in pairs {
            if i >= n_particles || j >= n_particles {
                return Err(AnalysisError::inconsistent(format!(
                    "pair ({}, {}) refers to a particle outside 0..{}",
                    i, j, n_particles
                )));
            }
            if i != j {
                degree[i] += 1;
                degree[j] += 1;
            }
        }

        let mut offsets = Vec::with_capacity(n_particles + 1);
        let mut total = 0usize;
        offsets.push(total);
        for d in &degree {
            total += d;
            offsets.push(total);
        }

        let mut fill = offsets[..n_particles].to_vec();
        let mut neighbours = vec![0usize; offsets[n_particles]];
        for &(i, j) in pairs {
            if i == j {
                continue;
            }
            neighbours[fill[i]] = j;
            fill[i] += 1;
            neighbours[fill[j]] = i;
            fill[j] += 1;
        }

        // sort and drop duplicate pairs, then compact
        let mut compact = Vec::with_capacity(neighbours.len());
        let mut compact_offsets = Vec::with_capacity(n_particles + 1);
        compact_offsets.push(0);
        for i in 0..n_particles {
            let row = &mut neighbours[offsets[i]..offsets[i + 1]];
            row.sort_unstable();
            let mut last = None;
            for &j in row.iter() {
                if last != Some(j) {
                    compact.push(j);
                    last = Some(j);
                }
            }
            compact_offsets.push(compact.len());
        }

        Ok(AdjacencyRelation { offsets: compact_offsets, neighbours: compact })
    }

    /// A relation with no edges.
    pub fn empty(n_particles: usize) -> Self {
        AdjacencyRelation { offsets: vec![0; n_particles + 1], neighbours: Vec::new() }
    }

    pub fn n_particles(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of undirected edges.
    pub fn n_edges(&self) -> usize {
        self.neighbours.len() / 2
    }

    #[inline]
    pub fn neighbours_of(&self, particle: usize) -> &[usize] {
        &self.neighbours[self.offsets[particle]..self.offsets[particle + 1]]
    }

    #[inline]
    pub fn degree(&self, particle: usize) -> usize {
        self.offsets[particle + 1] - self.offsets[particle]
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        if i >= self.n_particles() || j >= self.n_particles() {
            return false;
        }
        self.neighbours_of(i).binary_search(&j).is_ok()
    }

    /// Undirected edges `(i, j)` with `i < j`, in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n_particles()).flat_map(move |i| {
            self.neighbours_of(i).iter().filter(move |&&j| j > i).map(move |&j| (i, j))
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyMethod {
    /// Grid for large systems, all pairs for small ones
    #[default]
    Auto,
    Grid,
    BruteForce,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyConfig {
    /// Particles strictly closer than this are neighbours
    pub cutoff: f64,
    #[serde(default)]
    pub periodic: PeriodicMode,
    #[serde(default)]
    pub method: AdjacencyMethod,
}

impl AdjacencyConfig {
    pub fn new(cutoff: f64) -> Self {
        AdjacencyConfig { cutoff, periodic: PeriodicMode::default(), method: AdjacencyMethod::default() }
    }

    pub fn with_periodic(mut self, periodic: PeriodicMode) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn with_method(mut self, method: AdjacencyMethod) -> Self {
        self.method = method;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return Err(AnalysisError::config(format!(
                "cutoff must be positive and finite, got {}",
                self.cutoff
            )));
        }
        Ok(())
    }
}

/// Computes the neighbour relation of single frames.
///
/// Stateless between frames: calling `build` twice on the same input gives
/// identical relations.
#[derive(Clone, Debug)]
pub struct AdjacencyBuilder {
    config: AdjacencyConfig,
}

impl AdjacencyBuilder {
    pub fn new(config: AdjacencyConfig) -> Result<Self> {
        config.validate()?;
        Ok(AdjacencyBuilder { config })
    }

    pub fn config(&self) -> &AdjacencyConfig {
        &self.config
    }

    pub fn build(&self, positions: &[Position], dims: Option<&BoxDimensions>) -> Result<AdjacencyRelation> {
        let n = positions.len();
        if n < 2 {
            return Err(AnalysisError::config(format!(
                "adjacency needs at least 2 particles, got {}",
                n
            )));
        }
        if let Some(k) = positions.iter().position(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(AnalysisError::inconsistent(format!(
                "particle {} has a non-finite position {:?}",
                k, positions[k]
            )));
        }
        if let Some(d) = dims {
            d.validate()?;
        }

        let metric = Metric::new(self.config.periodic, dims);
        let cutoff = self.config.cutoff;
        let mut pairs = Vec::new();
        let use_grid = match self.config.method {
            AdjacencyMethod::Grid => true,
            AdjacencyMethod::BruteForce => false,
            AdjacencyMethod::Auto => n >= BRUTE_FORCE_LIMIT,
        };

        if use_grid {
            let grid = CellGrid::build(positions, cutoff, &metric);
            grid.for_each_pair(positions, cutoff, &metric, |i, j| pairs.push((i, j)));
        } else {
            let cutoff_sq = cutoff * cutoff;
            for i in 0..n {
                for j in (i + 1)..n {
                    if metric.distance_squared(&positions[i], &positions[j]) < cutoff_sq {
                        pairs.push((i, j));
                    }
                }
            }
        }

        AdjacencyRelation::from_pairs(n, &pairs)
    }
}
