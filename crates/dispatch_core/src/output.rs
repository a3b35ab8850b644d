//! JSON output writers (§6), one per stream, mirroring the teacher's
//! `telemetry_export` writer signatures (`Result<(), Box<dyn Error>>`)
//! but serializing with `serde`/`serde_json` instead of writing parquet.

use crate::commit::Reroute;
use crate::events::{AttemptRecord, Event, Move, VehicleTrack};
use crate::model::ReqId;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Serialize)]
struct Summary<'a> {
    served: &'a [ReqId],
    rejected: &'a [ReqId],
}

fn write_pretty<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

pub fn write_summary_json(
    path: impl AsRef<Path>,
    served: &[ReqId],
    rejected: &[ReqId],
) -> Result<(), Box<dyn Error>> {
    write_pretty(path, &Summary { served, rejected })
}

pub fn write_events_json(path: impl AsRef<Path>, events: &[Event]) -> Result<(), Box<dyn Error>> {
    write_pretty(path, &events)
}

pub fn write_moves_json(path: impl AsRef<Path>, moves: &[Move]) -> Result<(), Box<dyn Error>> {
    write_pretty(path, &moves)
}

pub fn write_tracks_json(path: impl AsRef<Path>, tracks: &[VehicleTrack]) -> Result<(), Box<dyn Error>> {
    write_pretty(path, &tracks)
}

pub fn write_reroutes_json(path: impl AsRef<Path>, reroutes: &[Reroute]) -> Result<(), Box<dyn Error>> {
    write_pretty(path, &reroutes)
}

pub fn write_attempts_json(
    path: impl AsRef<Path>,
    attempts: &HashMap<ReqId, AttemptRecord>,
) -> Result<(), Box<dyn Error>> {
    write_pretty(path, &attempts)
}

/// Writes every output stream into `dir`, isolating failures per stream:
/// a write failure on one stream is logged as a warning and does not
/// prevent the remaining streams from being written (§7).
pub fn write_all(dir: impl AsRef<Path>, out: &crate::orchestrator::RunOutput) {
    let dir = dir.as_ref();

    let streams: Vec<(&str, Box<dyn FnOnce() -> Result<(), Box<dyn Error>>>)> = vec![
        (
            "summary.json",
            Box::new(|| write_summary_json(dir.join("summary.json"), &out.served, &out.rejected)),
        ),
        (
            "events.json",
            Box::new(|| write_events_json(dir.join("events.json"), &out.events)),
        ),
        (
            "moves.json",
            Box::new(|| write_moves_json(dir.join("moves.json"), &out.moves)),
        ),
        (
            "tracks.json",
            Box::new(|| write_tracks_json(dir.join("tracks.json"), &out.tracks)),
        ),
        (
            "reroutes.json",
            Box::new(|| write_reroutes_json(dir.join("reroutes.json"), &out.reroutes)),
        ),
        (
            "attempts.json",
            Box::new(|| write_attempts_json(dir.join("attempts.json"), &out.attempts)),
        ),
    ];

    for (name, write) in streams {
        if let Err(err) = write() {
            eprintln!("failed to write {name}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_served_and_rejected() {
        let served = vec!["r1".to_string()];
        let rejected = vec!["r2".to_string()];
        let json = serde_json::to_string(&Summary {
            served: &served,
            rejected: &rejected,
        })
        .unwrap();
        assert!(json.contains("\"served\":[\"r1\"]"));
        assert!(json.contains("\"rejected\":[\"r2\"]"));
    }
}
