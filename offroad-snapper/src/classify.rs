use anyhow::Result;
use route_record::LatLng;

use crate::{distance, RouteResponse, RoutingLookup};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Classification {
    pub off_road: bool,
    /// Only set for off-road points
    pub snapped_point: Option<LatLng>,
    /// None if the road network couldn't be consulted
    pub distance_from_road: Option<f64>,
}

impl Classification {
    fn on_road(distance_from_road: Option<f64>) -> Self {
        Self {
            off_road: false,
            snapped_point: None,
            distance_from_road,
        }
    }
}

/// A zero-length route from the point to itself; the provider answers with the nearest point on
/// the road network.
pub fn snap_query(pos: LatLng) -> [LatLng; 2] {
    [pos, pos]
}

/// Decides whether `original` is off-road, given where the road network snapped it. With no snap
/// result nothing could be connected anyway, so the point counts as on-road.
pub fn classify(original: LatLng, snapped: Option<LatLng>, threshold_meters: f64) -> Classification {
    let Some(snapped) = snapped else {
        return Classification::on_road(None);
    };
    let dist = distance(original, snapped);
    if dist > threshold_meters {
        Classification {
            off_road: true,
            snapped_point: Some(snapped),
            distance_from_road: Some(dist),
        }
    } else {
        Classification::on_road(Some(dist))
    }
}

/// Classifies using the result of a snap query. Lookup failures fail open.
pub fn classify_response(
    original: LatLng,
    response: &Result<RouteResponse>,
    threshold_meters: f64,
) -> Classification {
    let snapped = response.as_ref().ok().and_then(|r| r.first_point());
    classify(original, snapped, threshold_meters)
}

pub fn classify_with(
    original: LatLng,
    lookup: &dyn RoutingLookup,
    threshold_meters: f64,
) -> Classification {
    let response = lookup.route(&snap_query(original));
    classify_response(original, &response, threshold_meters)
}
