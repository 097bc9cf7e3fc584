//! JSON reading and writing of providers and results.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use lipcore::data::groups::ParticleGroups;
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::data::leaflets::{LeafletRecord, LeafletTable};
use crate::data::trajectory::{InMemoryTrajectory, TrajectoryRecord};
use crate::error::Result;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Loads a trajectory and, when present, the per-particle group labels.
pub fn read_trajectory(path: &Path) -> Result<(InMemoryTrajectory, Option<ParticleGroups>)> {
    let record: TrajectoryRecord = read_json(path)?;
    let n_frames = record.frames.len();
    let loaded = record.into_trajectory()?;
    info!("loaded {} frames from {}", n_frames, path.display());
    Ok(loaded)
}

pub fn read_leaflets(path: &Path) -> Result<LeafletTable> {
    let record: LeafletRecord = read_json(path)?;
    Ok(record.into_table()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lipcore::data::provider::{FramePositionProvider, LeafletLabelProvider};
    use lipcore::flipflop::detector::{FlipFlopEvent, FlipFlopEvents};
    use lipcore::flipflop::state::Outcome;
    use lipcore::Leaflet;

    use crate::error::TrajError;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("liptraj-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_read_trajectory_and_leaflets() {
        let traj_path = temp_path("traj.json");
        std::fs::write(
            &traj_path,
            r#"{"frames": [[[0, 0, 0], [1, 0, 0]], [[0, 0, 0], [3, 0, 0]]], "groups": ["A", "B"]}"#,
        )
        .unwrap();
        let (traj, groups) = read_trajectory(&traj_path).unwrap();
        assert_eq!(traj.n_frames(), 2);
        assert_eq!(groups.unwrap().n_particles(), 2);

        let leaflet_path = temp_path("leaflets.json");
        std::fs::write(&leaflet_path, r#"{"labels": [[1, -1], [0, 0]]}"#).unwrap();
        let table = read_leaflets(&leaflet_path).unwrap();
        assert_eq!(table.leaflet_label(0, 1), Leaflet::Lower);

        std::fs::remove_file(traj_path).ok();
        std::fs::remove_file(leaflet_path).ok();
    }

    #[test]
    fn test_events_round_trip() {
        let events = FlipFlopEvents {
            events: vec![FlipFlopEvent {
                particle: 3,
                departure_frame: 10,
                arrival_frame: 12,
                leaflet: Leaflet::Upper,
                outcome: Outcome::Success,
            }],
        };
        let path = temp_path("events.json");
        write_json(&path, &events).unwrap();
        let back: FlipFlopEvents = read_json(&path).unwrap();
        assert_eq!(back, events);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_and_bad_json() {
        assert!(matches!(
            read_leaflets(&temp_path("does-not-exist.json")),
            Err(TrajError::Io(_))
        ));

        let path = temp_path("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(read_leaflets(&path), Err(TrajError::Serialization(_))));

        std::fs::write(&path, r#"{"labels": [[1, 7]]}"#).unwrap();
        assert!(matches!(read_leaflets(&path), Err(TrajError::Analysis(_))));
        std::fs::remove_file(path).ok();
    }
}
