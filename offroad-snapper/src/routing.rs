use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use route_record::LatLng;

/// A routing provider. The same call answers both real multi-point routes and snap-to-road
/// queries, where the one point is passed twice.
pub trait RoutingLookup {
    fn route(&self, points: &[LatLng]) -> Result<RouteResponse>;
}

#[derive(Clone, Debug, Default)]
pub struct RouteResponse {
    pub path_segments: Vec<Vec<LatLng>>,
    pub distance_meters: f64,
    pub time_seconds: f64,
    /// Exactly what the provider returned; this is what gets saved
    pub raw: serde_json::Value,
}

impl RouteResponse {
    /// Reads the provider's GeoJSON FeatureCollection. Only the first feature matters. Anything
    /// unexpected just means there's no geometry.
    pub fn from_geojson(raw: serde_json::Value) -> RouteResponse {
        let mut response = RouteResponse {
            raw,
            ..Default::default()
        };

        let feature = match GeoJson::from_json_value(response.raw.clone()) {
            Ok(GeoJson::FeatureCollection(fc)) => fc.features.into_iter().next(),
            Ok(GeoJson::Feature(f)) => Some(f),
            Ok(GeoJson::Geometry(_)) | Err(_) => None,
        };
        let Some(feature) = feature else {
            return response;
        };

        if let Some(geometry) = &feature.geometry {
            response.path_segments = match &geometry.value {
                geojson::Value::LineString(line) => vec![to_segment(line)],
                geojson::Value::MultiLineString(lines) => {
                    lines.iter().map(|line| to_segment(line)).collect()
                }
                _ => Vec::new(),
            };
            response.path_segments.retain(|seg| !seg.is_empty());
        }

        if let Some(legs) = feature.property("legs").and_then(|x| x.as_array()) {
            for leg in legs {
                let get = |key: &str| leg.get(key).and_then(|x| x.as_f64()).unwrap_or(0.0);
                response.distance_meters += get("distance");
                response.time_seconds += get("time");
            }
        }

        response
    }

    /// Builds a response (and the raw GeoJSON a provider would have sent) from known geometry
    pub fn from_segments(path_segments: Vec<Vec<LatLng>>) -> RouteResponse {
        let lines = path_segments
            .iter()
            .map(|seg| seg.iter().map(|pt| vec![pt.lng, pt.lat]).collect())
            .collect();
        let feature = Feature::from(Geometry::new(geojson::Value::MultiLineString(lines)));
        let fc: FeatureCollection = vec![feature].into_iter().collect();
        let raw = serde_json::to_value(&fc).unwrap_or_default();
        RouteResponse {
            path_segments,
            distance_meters: 0.0,
            time_seconds: 0.0,
            raw,
        }
    }

    pub fn has_geometry(&self) -> bool {
        !self.path_segments.is_empty()
    }

    /// For a snap query, the point on the road network
    pub fn first_point(&self) -> Option<LatLng> {
        self.path_segments.first()?.first().copied()
    }

    /// All segments joined into one path
    pub fn path(&self) -> Vec<LatLng> {
        self.path_segments.iter().flatten().copied().collect()
    }
}

/// GeoJSON positions are `[lng, lat]`
fn to_segment(line: &[Vec<f64>]) -> Vec<LatLng> {
    line.iter()
        .filter(|pos| pos.len() >= 2)
        .map(|pos| LatLng::new(pos[1], pos[0]))
        .filter(|pt| pt.is_valid())
        .collect()
}
