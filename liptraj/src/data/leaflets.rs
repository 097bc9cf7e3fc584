use lipcore::data::leaflet::{Leaflet, LeafletSeries};
use lipcore::data::provider::LeafletLabelProvider;
use lipcore::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Leaflet labels of every particle in every trajectory frame.
#[derive(Clone, Debug)]
pub struct LeafletTable {
    particle_indices: Vec<usize>,
    series: LeafletSeries,
}

impl LeafletTable {
    pub fn new(particle_indices: Vec<usize>, series: LeafletSeries) -> Result<Self> {
        if particle_indices.len() != series.n_particles() {
            return Err(AnalysisError::inconsistent(format!(
                "{} particle indices for {} label rows",
                particle_indices.len(),
                series.n_particles()
            )));
        }
        Ok(LeafletTable { particle_indices, series })
    }

    /// One row of `-1/0/1` labels per particle, particles numbered `0..n`.
    pub fn from_rows(rows: &[Vec<i8>]) -> Result<Self> {
        let series = LeafletSeries::from_rows(rows)?;
        LeafletTable::new((0..rows.len()).collect(), series)
    }
}

impl LeafletLabelProvider for LeafletTable {
    fn particle_indices(&self) -> &[usize] {
        &self.particle_indices
    }

    fn n_frames(&self) -> usize {
        self.series.n_frames()
    }

    fn leaflet_label(&self, particle: usize, frame: usize) -> Leaflet {
        self.series.label(particle, frame)
    }
}

/// On-disk layout of a leaflet table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeafletRecord {
    #[serde(default)]
    pub particle_indices: Option<Vec<usize>>,
    /// `labels[particle][frame]` in `{-1, 0, 1}`
    pub labels: Vec<Vec<i8>>,
}

impl LeafletRecord {
    pub fn into_table(self) -> Result<LeafletTable> {
        let series = LeafletSeries::from_rows(&self.labels)?;
        let particle_indices = self.particle_indices.unwrap_or_else(|| (0..self.labels.len()).collect());
        LeafletTable::new(particle_indices, series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_provider() {
        let table = LeafletTable::from_rows(&[vec![1, 0, -1], vec![-1, -1, -1]]).unwrap();
        assert_eq!(table.n_particles(), 2);
        assert_eq!(table.n_frames(), 3);
        assert_eq!(table.leaflet_label(0, 1), Leaflet::Midplane);
        assert_eq!(table.leaflet_label(1, 2), Leaflet::Lower);
    }

    #[test]
    fn test_record_conversion() {
        let record: LeafletRecord =
            serde_json::from_str(r#"{"particle_indices": [4, 2], "labels": [[1, 1], [0, -1]]}"#).unwrap();
        let table = record.into_table().unwrap();
        assert_eq!(table.particle_indices(), &[4, 2]);

        let record: LeafletRecord =
            serde_json::from_str(r#"{"particle_indices": [4], "labels": [[1, 1], [0, -1]]}"#).unwrap();
        assert!(record.into_table().is_err());
    }
}
