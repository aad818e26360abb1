//! The persisted shape of saved routes. Field names match what the browser app has always written
//! to storage, so collections saved by older builds still load.

use geo::Coord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Two coordinates closer than this in both lat and lng are the same physical point (~0.1m).
pub const COORDINATE_TOLERANCE: f64 = 0.000001;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A coordinate rounded to 6 decimal places, usable as a hash key for de-duplication.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PointKey(i64, i64);

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn same_point(&self, other: &LatLng) -> bool {
        (self.lat - other.lat).abs() < COORDINATE_TOLERANCE
            && (self.lng - other.lng).abs() < COORDINATE_TOLERANCE
    }

    pub fn key(&self) -> PointKey {
        PointKey(
            (self.lat * 1_000_000.0).round() as i64,
            (self.lng * 1_000_000.0).round() as i64,
        )
    }

    pub fn midpoint(&self, other: &LatLng) -> LatLng {
        LatLng::new((self.lat + other.lat) / 2.0, (self.lng + other.lng) / 2.0)
    }
}

// geo works in x/y, so lng comes first
impl From<LatLng> for Coord {
    fn from(pt: LatLng) -> Self {
        Coord {
            x: pt.lng,
            y: pt.lat,
        }
    }
}

impl From<Coord> for LatLng {
    fn from(c: Coord) -> Self {
        LatLng::new(c.y, c.x)
    }
}

/// Where a connector's distance label sits and what it says. Users may have edited either, so a
/// saved label is restored verbatim.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ConnectorLabel {
    pub position: LatLng,
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointRecord {
    pub position: LatLng,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_off_road: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub snapped_point: Option<LatLng>,
    /// Index of the anchor within the same route's checkpoint list
    #[serde(default, deserialize_with = "lenient")]
    pub connector_to: Option<usize>,
    /// Raw anchor coordinate, used when the anchor only exists in some other saved route
    #[serde(default, deserialize_with = "lenient")]
    pub connector_to_position: Option<LatLng>,
    #[serde(default, deserialize_with = "lenient")]
    pub connector_label: Option<ConnectorLabel>,
}

impl CheckpointRecord {
    /// Older saves only set `snappedPoint`, so either one marks the point as off-road.
    pub fn off_road(&self) -> bool {
        self.is_off_road || self.snapped_point.is_some()
    }
}

/// Straight-line distance between two checkpoints, using 1-based checkpoint numbers.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct PairDistance {
    pub from: usize,
    pub to: usize,
    pub distance: f64,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct RouteRecord {
    #[serde(default)]
    pub label: String,
    /// The routing provider's raw response, kept so the path can be redrawn without a request
    #[serde(default)]
    pub response: serde_json::Value,
    #[serde(default)]
    pub distances: Vec<PairDistance>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointRecord>,
}

// Optional fields that are present but malformed read as absent, instead of failing the whole
// checkpoint.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, bool>(deserializer)?.unwrap_or(false))
}
