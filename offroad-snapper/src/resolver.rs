use route_record::{CheckpointRecord, LatLng};

use crate::{distance, CheckpointId, Checkpoints};

/// A checkpoint known only by value, before (or without) a live entity existing for it
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CandidateRecord {
    pub position: LatLng,
    pub off_road: bool,
}

impl From<&CheckpointRecord> for CandidateRecord {
    fn from(record: &CheckpointRecord) -> Self {
        Self {
            position: record.position,
            off_road: record.off_road(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Anchor {
    pub position: LatLng,
    pub distance: f64,
    /// The live checkpoint at `position`. None if the winner was a record with nothing
    /// materialized for it yet.
    pub checkpoint: Option<CheckpointId>,
}

/// Finds the closest on-road checkpoint to `from`, searching live checkpoints first and then the
/// records. Something at distance 0 is the same physical point and never counts. Ties go to
/// whichever was seen first.
pub fn find_nearest_on_road(
    from: LatLng,
    excluding: Option<CheckpointId>,
    live: &Checkpoints,
    records: &[CandidateRecord],
) -> Option<Anchor> {
    let mut best: Option<Anchor> = None;
    let mut consider = |position: LatLng, checkpoint: Option<CheckpointId>| {
        let dist = distance(from, position);
        if dist > 0.0 && best.map_or(true, |b| dist < b.distance) {
            best = Some(Anchor {
                position,
                distance: dist,
                checkpoint,
            });
        }
    };

    for (id, cp) in live.iter() {
        if Some(id) == excluding || !cp.on_road() {
            continue;
        }
        consider(cp.position, Some(id));
    }

    for record in records {
        if record.off_road || !record.position.is_valid() {
            continue;
        }
        // A live entity at the same point takes precedence over what the record claims
        let checkpoint = live.find(record.position);
        if let Some(id) = checkpoint {
            if Some(id) == excluding || !live.get(id).map_or(false, |cp| cp.on_road()) {
                continue;
            }
        }
        consider(record.position, checkpoint);
    }

    best
}
