// Copyright Catenary Transit Initiatives
// Per-dimension attribute comparators used by match scoring

use crate::entities::{Entity, GeoPoint};
use crate::normalize::{normalize_name, normalize_onestop_id};
use geo::{Distance, Haversine};
use strsim::jaro_winkler;

/// Identifier dimension: Onestop IDs are compared on their normalized form.
pub fn identifier_equal(a: &Entity, b: &Entity) -> bool {
    normalize_onestop_id(&a.onestop_id) == normalize_onestop_id(&b.onestop_id)
}

/// Distance in meters between two lat/lon points
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(
        geo::Point::new(a.lon, a.lat),
        geo::Point::new(b.lon, b.lat),
    )
}

/// Jaro-Winkler similarity over normalized display names.
/// A missing name on either side scores 0.0.
pub fn name_similarity(a: &Entity, b: &Entity) -> f64 {
    let name_a = normalize_name(&a.name);
    let name_b = normalize_name(&b.name);

    if name_a.is_empty() || name_b.is_empty() {
        return 0.0;
    }

    jaro_winkler(&name_a, &name_b)
}

/// Proximity score: 1.0 at the same point, falling linearly to 0.0 at
/// `radius_meters`. Missing geometry on either side scores 0.0.
pub fn proximity(a: &Entity, b: &Entity, radius_meters: f64) -> f64 {
    match (a.point, b.point) {
        (Some(point_a), Some(point_b)) => {
            let distance = haversine_meters(point_a, point_b);
            1.0 - (distance / radius_meters).min(1.0)
        }
        _ => 0.0,
    }
}
