use log::{debug, info, warn};

use route_record::LatLng;

use crate::CheckpointId;

/// How a connector's anchor was found
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Resolution {
    /// The anchor coordinate saved with the record
    SavedPosition,
    /// The anchor's index in the same route's checkpoint list
    SavedIndex,
    /// No usable saved anchor; the nearest on-road checkpoint
    Nearest,
}

/// Diagnostics from the engine. Nothing here affects behavior.
#[derive(Clone, PartialEq, Debug)]
pub enum Event {
    MalformedCheckpoint {
        route: usize,
        index: usize,
    },
    CheckpointMaterialized {
        checkpoint: CheckpointId,
        position: LatLng,
        off_road: bool,
    },
    DuplicateCheckpoint {
        checkpoint: CheckpointId,
        route: usize,
        index: usize,
    },
    SavedAnchorRejected {
        checkpoint: CheckpointId,
        target: LatLng,
    },
    Connected {
        from: CheckpointId,
        to: CheckpointId,
        distance_meters: f64,
        resolution: Resolution,
    },
    Unresolved {
        checkpoint: CheckpointId,
        position: LatLng,
    },
    ClickDiscarded {
        position: LatLng,
    },
    SnapFailed {
        position: LatLng,
        error: String,
    },
    CorruptStorage {
        error: String,
    },
    RestoreFinished {
        routes: usize,
        checkpoints: usize,
        connectors: usize,
        unresolved: usize,
    },
}

pub trait Observer {
    fn emit(&self, event: &Event);
}

/// Forwards events to the `log` facade
pub struct LogObserver;

impl Observer for LogObserver {
    fn emit(&self, event: &Event) {
        match event {
            Event::MalformedCheckpoint { route, index } => {
                warn!("Skipping malformed checkpoint {index} in saved route {route}");
            }
            Event::CheckpointMaterialized {
                checkpoint,
                position,
                off_road,
            } => {
                debug!(
                    "Checkpoint {:?} at {}, {} (off-road: {off_road})",
                    checkpoint, position.lat, position.lng
                );
            }
            Event::DuplicateCheckpoint {
                checkpoint,
                route,
                index,
            } => {
                debug!("Checkpoint {index} of route {route} is already {:?}", checkpoint);
            }
            Event::SavedAnchorRejected { checkpoint, target } => {
                warn!(
                    "Saved connector target {}, {} for {:?} is missing or not on-road; using the nearest on-road checkpoint",
                    target.lat, target.lng, checkpoint
                );
            }
            Event::Connected {
                from,
                to,
                distance_meters,
                resolution,
            } => {
                debug!(
                    "Connected {:?} to {:?} ({:.2}m, {:?})",
                    from, to, distance_meters, resolution
                );
            }
            Event::Unresolved {
                checkpoint,
                position,
            } => {
                warn!(
                    "No on-road checkpoint to connect off-road {:?} at {}, {}",
                    checkpoint, position.lat, position.lng
                );
            }
            Event::ClickDiscarded { position } => {
                debug!(
                    "Dropping snap result for {}, {}; the session changed",
                    position.lat, position.lng
                );
            }
            Event::SnapFailed { position, error } => {
                warn!("Error snapping {}, {} to road: {error}", position.lat, position.lng);
            }
            Event::CorruptStorage { error } => {
                warn!("Saved routes are unreadable, starting empty: {error}");
            }
            Event::RestoreFinished {
                routes,
                checkpoints,
                connectors,
                unresolved,
            } => {
                info!(
                    "Restored {routes} routes: {checkpoints} checkpoints, {connectors} connectors, {unresolved} unresolved"
                );
            }
        }
    }
}
