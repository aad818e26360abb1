use route_record::{LatLng, PairDistance};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in meters. Returns 0 for non-finite input; callers treat distance as a
/// best-effort signal.
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    if !a.is_valid() || !b.is_valid() {
        return 0.0;
    }

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for near-antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Every pair `i < j` of valid points, numbered from 1. Coincident pairs are left out.
pub fn pairwise_distances(points: &[LatLng]) -> Vec<PairDistance> {
    let valid: Vec<LatLng> = points.iter().copied().filter(|pt| pt.is_valid()).collect();
    if valid.len() < 2 {
        return Vec::new();
    }

    let mut result = Vec::new();
    for i in 0..valid.len() {
        for j in (i + 1)..valid.len() {
            let dist = distance(valid[i], valid[j]);
            if dist > 0.0 {
                result.push(PairDistance {
                    from: i + 1,
                    to: j + 1,
                    distance: (dist * 100.0).round() / 100.0,
                });
            }
        }
    }
    result
}

/// How the distance table shows a pair
pub fn format_pair_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.2} km", meters / 1000.0)
    } else {
        format!("{:.2} m", meters)
    }
}
