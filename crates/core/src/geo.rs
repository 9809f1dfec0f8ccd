//! Great-circle distance between geographic points.

use carelink_types::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres, using the
/// haversine formula.
///
/// Accuracy is within ~0.5% of true geodesic distance, which is more than
/// enough for ranking providers by proximity.
pub fn great_circle_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).expect("test coordinates should be valid")
    }

    #[test]
    fn test_zero_distance_for_identical_points() {
        let p = point(40.7128, -74.0060);
        assert_eq!(great_circle_km(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let london = point(51.5074, -0.1278);
        let paris = point(48.8566, 2.3522);
        let there = great_circle_km(london, paris);
        let back = great_circle_km(paris, london);
        assert!((there - back).abs() < 1e-9, "distance should be symmetric");
    }

    #[test]
    fn test_known_city_pair_distance() {
        // London to Paris is roughly 344 km.
        let london = point(51.5074, -0.1278);
        let paris = point(48.8566, 2.3522);
        let km = great_circle_km(london, paris);
        assert!(
            (km - 344.0).abs() < 5.0,
            "London-Paris should be ~344 km, got {km}"
        );
    }

    #[test]
    fn test_antimeridian_pair_is_finite_and_positive() {
        let east = point(0.0, 179.5);
        let west = point(0.0, -179.5);
        let km = great_circle_km(east, west);
        assert!(km.is_finite() && km > 0.0);
        assert!(km < 200.0, "points 1 degree apart should be ~111 km, got {km}");
    }
}
