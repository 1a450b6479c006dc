//! Great-circle distance helpers for neighborhood searches.

use crate::domain::BoundingBox;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// A rectangle that contains every point within `radius_km` of the origin.
///
/// Longitude span widens toward the poles; near them the box covers every
/// longitude.
pub fn bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let d_lat = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let min_lat = (lat - d_lat).max(-90.0);
    let max_lat = (lat + d_lat).min(90.0);

    let cos_lat = lat.to_radians().cos();
    let (min_lon, max_lon) = if max_lat >= 90.0 || min_lat <= -90.0 || cos_lat <= f64::EPSILON {
        (-180.0, 180.0)
    } else {
        let d_lon = (radius_km / (EARTH_RADIUS_KM * cos_lat)).to_degrees();
        if d_lon >= 180.0 || lon - d_lon < -180.0 || lon + d_lon > 180.0 {
            // Crosses the antimeridian; fall back to the full band.
            (-180.0, 180.0)
        } else {
            (lon - d_lon, lon + d_lon)
        }
    };

    BoundingBox {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lagos_to_abuja_is_about_525_km() {
        // Lagos (6.5244, 3.3792), Abuja (9.0765, 7.3986)
        let d = haversine_km(6.5244, 3.3792, 9.0765, 7.3986);
        assert!((d - 525.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_km(6.45, 3.39, 6.45, 3.39), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = haversine_km(6.60, 3.35, 6.43, 3.42);
        let b = haversine_km(6.43, 3.42, 6.60, 3.35);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_contains_points_within_radius() {
        let bbox = bounding_box(6.5244, 3.3792, 10.0);
        assert!(bbox.contains(6.5244, 3.3792));
        assert!(bbox.contains(6.58, 3.35));
        assert!(!bbox.contains(9.0765, 7.3986));
    }

    #[test]
    fn bounding_box_near_pole_spans_all_longitudes() {
        let bbox = bounding_box(89.99, 0.0, 50.0);
        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.max_lon, 180.0);
    }
}
