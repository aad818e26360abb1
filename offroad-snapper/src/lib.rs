//! Places checkpoints on a map and keeps off-road ones connected to the road network.
//!
//! A checkpoint the routing provider snaps more than a few meters away is off-road. It gets a
//! straight connector to the nearest on-road checkpoint, and that relationship survives saving
//! routes and restoring them later, even when several saved routes share checkpoints.

pub use route_record::{
    CheckpointRecord, ConnectorLabel, LatLng, PairDistance, PointKey, RouteRecord,
    COORDINATE_TOLERANCE,
};

pub use self::checkpoints::{Checkpoint, CheckpointId, Checkpoints};
pub use self::classify::{classify, classify_response, classify_with, snap_query, Classification};
pub use self::codec::{
    decode, decode_collection, decode_record, encode, export_collection, ConnectorTarget,
    DecodedRoute, Route, RouteCheckpoint,
};
pub use self::config::Config;
pub use self::connector::{format_distance, Connector, Connectors};
pub use self::events::{Event, LogObserver, Observer, Resolution};
pub use self::geodistance::{distance, format_pair_distance, pairwise_distances};
pub use self::resolver::{find_nearest_on_road, Anchor, CandidateRecord};
pub use self::restore::RestoreReport;
pub use self::routing::{RouteResponse, RoutingLookup};
pub use self::session::{
    CalculateError, CalculatedRoute, ClickOutcome, DrawnRoute, PendingClick, Session,
};
pub use self::store::{append_route, load_collection, FileStore, MemoryStore, RouteStore};
pub use self::surface::{
    DrawingSurface, LabelHandle, LineHandle, LineStyle, MarkerHandle, RecordedLabel, RecordedLine,
    RecordedMarker, RecordingSurface,
};

mod checkpoints;
mod classify;
mod codec;
mod config;
mod connector;
mod events;
mod geodistance;
#[cfg(target_arch = "wasm32")]
mod js;
mod resolver;
mod restore;
mod routing;
mod session;
mod store;
mod surface;
