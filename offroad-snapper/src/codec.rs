use anyhow::{bail, Result};
use route_record::{CheckpointRecord, ConnectorLabel, LatLng, PairDistance, RouteRecord};

use crate::CandidateRecord;

/// Where an off-road checkpoint's connector goes, by coordinate
#[derive(Clone, PartialEq, Debug)]
pub struct ConnectorTarget {
    pub position: LatLng,
    pub label: Option<ConnectorLabel>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RouteCheckpoint {
    pub position: LatLng,
    pub off_road: bool,
    pub snapped_point: Option<LatLng>,
    pub connector: Option<ConnectorTarget>,
}

impl RouteCheckpoint {
    fn is_off_road(&self) -> bool {
        self.off_road || self.snapped_point.is_some()
    }
}

/// A route in memory. Connector targets are coordinates here; indices only exist in the saved
/// form.
#[derive(Clone, PartialEq, Debug)]
pub struct Route {
    /// Empty means unlabelled
    pub label: String,
    pub response: serde_json::Value,
    pub distances: Vec<PairDistance>,
    pub checkpoints: Vec<RouteCheckpoint>,
}

pub fn encode(route: &Route) -> RouteRecord {
    let mut checkpoints = Vec::new();
    for (idx, cp) in route.checkpoints.iter().enumerate() {
        let mut record = CheckpointRecord {
            position: cp.position,
            is_off_road: cp.is_off_road(),
            snapped_point: None,
            connector_to: None,
            connector_to_position: None,
            connector_label: None,
        };

        // On-road checkpoints never own a connector
        if cp.is_off_road() {
            record.snapped_point = cp.snapped_point;
            if let Some(target) = &cp.connector {
                let in_route = route
                    .checkpoints
                    .iter()
                    .enumerate()
                    .position(|(other_idx, other)| {
                        other_idx != idx && other.position.same_point(&target.position)
                    });
                match in_route {
                    Some(other_idx) => record.connector_to = Some(other_idx),
                    // The anchor lives in some other route, and indices aren't global
                    None => record.connector_to_position = Some(target.position),
                }
                record.connector_label = target.label.clone();
            }
        }

        checkpoints.push(record);
    }

    RouteRecord {
        label: route.label.clone(),
        response: route.response.clone(),
        distances: route.distances.clone(),
        checkpoints,
    }
}

/// A saved route as read back from storage.
#[derive(Clone, PartialEq, Debug)]
pub struct DecodedRoute {
    pub label: String,
    pub response: serde_json::Value,
    pub distances: Vec<PairDistance>,
    /// Indexed exactly as saved. Malformed entries stay as None, so `connectorTo` indices still
    /// point at the right checkpoint.
    pub slots: Vec<Option<CheckpointRecord>>,
}

impl DecodedRoute {
    /// Valid checkpoints with their original indices
    pub fn checkpoints(&self) -> impl Iterator<Item = (usize, &CheckpointRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|cp| (idx, cp)))
    }

    pub fn malformed(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn checkpoint(&self, idx: usize) -> Option<&CheckpointRecord> {
        self.slots.get(idx)?.as_ref()
    }

    /// The saved anchor coordinate for a checkpoint, preferring the raw coordinate over the index
    pub fn saved_anchor(&self, record: &CheckpointRecord) -> Option<LatLng> {
        if let Some(pos) = record.connector_to_position {
            return pos.is_valid().then_some(pos);
        }
        let idx = record.connector_to?;
        Some(self.checkpoint(idx)?.position)
    }

    pub fn candidates(&self) -> Vec<CandidateRecord> {
        self.checkpoints().map(|(_, cp)| cp.into()).collect()
    }

    /// Packs the valid checkpoints back together, resolving index targets to coordinates first
    pub fn to_route(&self) -> Route {
        let checkpoints = self
            .checkpoints()
            .map(|(_, record)| {
                let off_road = record.off_road();
                let connector = if off_road {
                    self.saved_anchor(record).map(|position| ConnectorTarget {
                        position,
                        label: record.connector_label.clone(),
                    })
                } else {
                    None
                };
                RouteCheckpoint {
                    position: record.position,
                    off_road,
                    snapped_point: if off_road { record.snapped_point } else { None },
                    connector,
                }
            })
            .collect();

        Route {
            label: self.label.clone(),
            response: self.response.clone(),
            distances: self.distances.clone(),
            checkpoints,
        }
    }
}

/// Reads one saved route. Missing fields take defaults; checkpoints without a usable position are
/// dropped but keep their slot. Returns None only if `value` isn't an object at all.
pub fn decode(value: &serde_json::Value) -> Option<DecodedRoute> {
    let obj = value.as_object()?;

    let label = obj
        .get("label")
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .to_string();
    let response = obj.get("response").cloned().unwrap_or_default();
    let distances = obj
        .get("distances")
        .and_then(|x| serde_json::from_value(x.clone()).ok())
        .unwrap_or_default();

    let mut slots = Vec::new();
    if let Some(items) = obj.get("checkpoints").and_then(|x| x.as_array()) {
        for item in items {
            let record = serde_json::from_value::<CheckpointRecord>(item.clone())
                .ok()
                .filter(|cp| cp.position.is_valid());
            slots.push(record);
        }
    }

    Some(DecodedRoute {
        label,
        response,
        distances,
        slots,
    })
}

pub fn decode_record(record: &RouteRecord) -> Option<DecodedRoute> {
    decode(&serde_json::to_value(record).ok()?)
}

/// Parses a whole saved collection. Entries that aren't objects are skipped.
pub fn decode_collection(raw: &str) -> Result<Vec<DecodedRoute>> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let Some(items) = value.as_array() else {
        bail!("saved routes should be a JSON array");
    };
    Ok(items.iter().filter_map(decode).collect())
}

/// The flat, human-readable export of every saved route
pub fn export_collection(records: &[RouteRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
