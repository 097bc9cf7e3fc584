use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Sorted, de-duplicated set of particle indices.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleSelection {
    indices: Vec<usize>,
}

impl ParticleSelection {
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        ParticleSelection { indices }
    }

    pub fn all(n_particles: usize) -> Self {
        ParticleSelection { indices: (0..n_particles).collect() }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, particle: usize) -> bool {
        self.indices.binary_search(&particle).is_ok()
    }

    /// Dense membership flags over `0..n_particles`.
    ///
    /// Fails if the selection refers to a particle outside that range.
    pub fn to_flags(&self, n_particles: usize) -> Result<Vec<bool>> {
        let mut flags = vec![false; n_particles];
        for &p in &self.indices {
            if p >= n_particles {
                return Err(AnalysisError::inconsistent(format!(
                    "selection refers to particle {} but only {} particles exist",
                    p, n_particles
                )));
            }
            flags[p] = true;
        }
        Ok(flags)
    }
}

impl FromIterator<usize> for ParticleSelection {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        ParticleSelection::new(iter.into_iter().collect())
    }
}

/// Group label (e.g. species name) of every particle in analysis order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleGroups {
    labels: Vec<String>,
}

impl ParticleGroups {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        ParticleGroups { labels: labels.into_iter().map(Into::into).collect() }
    }

    pub fn n_particles(&self) -> usize {
        self.labels.len()
    }

    pub fn label(&self, particle: usize) -> &str {
        &self.labels[particle]
    }

    /// Distinct labels, sorted.
    pub fn unique_labels(&self) -> Vec<String> {
        let mut unique: Vec<String> = self.labels.clone();
        unique.sort();
        unique.dedup();
        unique
    }

    /// Index of each particle's label in `unique_labels()`.
    pub fn label_ids(&self) -> (Vec<String>, Vec<usize>) {
        let unique = self.unique_labels();
        let lookup: BTreeMap<&str, usize> =
            unique.iter().enumerate().map(|(k, l)| (l.as_str(), k)).collect();
        let ids = self.labels.iter().map(|l| lookup[l.as_str()]).collect();
        (unique, ids)
    }

    /// Selects every particle whose label is in `names`.
    ///
    /// Fails with a configuration error if nothing matches.
    pub fn select(&self, names: &[&str]) -> Result<ParticleSelection> {
        let selection: ParticleSelection = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| names.contains(&l.as_str()))
            .map(|(i, _)| i)
            .collect();
        if selection.is_empty() {
            return Err(AnalysisError::config(format!("selection {:?} matches no particles", names)));
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_is_sorted_and_unique() {
        let sel = ParticleSelection::new(vec![5, 1, 5, 3]);
        assert_eq!(sel.indices(), &[1, 3, 5]);
        assert!(sel.contains(3));
        assert!(!sel.contains(2));
        assert_eq!(sel.to_flags(6).unwrap(), vec![false, true, false, true, false, true]);
        assert!(sel.to_flags(4).is_err());
    }

    #[test]
    fn test_group_select() {
        let groups = ParticleGroups::new(["DPPC", "CHOL", "DOPC", "CHOL"]);
        assert_eq!(groups.select(&["CHOL"]).unwrap().indices(), &[1, 3]);
        assert_eq!(groups.select(&["DPPC", "DOPC"]).unwrap().indices(), &[0, 2]);
        assert!(groups.select(&["POPE"]).unwrap_err().is_configuration());

        let (labels, ids) = groups.label_ids();
        assert_eq!(labels, vec!["CHOL", "DOPC", "DPPC"]);
        assert_eq!(ids, vec![2, 0, 1, 0]);
    }
}
