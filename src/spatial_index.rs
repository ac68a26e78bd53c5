// Copyright Catenary Transit Initiatives
// In-memory spatial candidate lookup over a datastore snapshot

use crate::batch::{CandidateLookup, DatastoreError};
use crate::comparators::haversine_meters;
use crate::entities::{Entity, EntityKind, GeoPoint};
use ahash::AHashMap;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

// Degrees per meter at the equator; the query window is widened by the
// latitude cosine plus a margin so it never undershoots the radius, the
// exact haversine filter runs afterwards.
const METERS_PER_DEGREE: f64 = 111_000.0;
const DEGREE_WINDOW_MARGIN: f64 = 1.2;

#[derive(Clone, Debug)]
struct SpatialEntity {
    position: [f64; 2],
    entity: Entity,
}

impl RTreeObject for SpatialEntity {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for SpatialEntity {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// One R-tree per entity kind, built from a datastore snapshot. Entities
/// without geometry are accepted but never returned by a spatial query.
/// Production deployments substitute a PostGIS-backed lookup behind the
/// same trait.
pub struct SpatialEntityIndex {
    trees: AHashMap<EntityKind, RTree<SpatialEntity>>,
    indexed: usize,
    skipped_no_geometry: usize,
}

impl SpatialEntityIndex {
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> SpatialEntityIndex {
        let mut by_kind: AHashMap<EntityKind, Vec<SpatialEntity>> = AHashMap::new();
        let mut skipped_no_geometry = 0;

        for entity in entities {
            match entity.point {
                Some(point) => {
                    by_kind.entry(entity.kind).or_default().push(SpatialEntity {
                        position: [point.lon, point.lat],
                        entity,
                    });
                }
                None => skipped_no_geometry += 1,
            }
        }

        let mut trees = AHashMap::new();
        let mut indexed = 0;
        for (kind, spatial_entities) in by_kind {
            indexed += spatial_entities.len();
            trees.insert(kind, RTree::bulk_load(spatial_entities));
        }

        SpatialEntityIndex {
            trees,
            indexed,
            skipped_no_geometry,
        }
    }

    pub fn len(&self) -> usize {
        self.indexed
    }

    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }

    pub fn skipped_no_geometry(&self) -> usize {
        self.skipped_no_geometry
    }
}

impl CandidateLookup for SpatialEntityIndex {
    fn find_candidates(
        &self,
        kind: EntityKind,
        point: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<Entity>, DatastoreError> {
        if !point.lat.is_finite() || !point.lon.is_finite() {
            return Err(format!("malformed query point ({}, {})", point.lat, point.lon).into());
        }

        let tree = match self.trees.get(&kind) {
            Some(tree) => tree,
            None => return Ok(Vec::new()),
        };

        let cos_lat = point.lat.to_radians().cos().abs().max(0.01);
        let window_degrees = (radius_meters / METERS_PER_DEGREE) * DEGREE_WINDOW_MARGIN / cos_lat;

        let mut candidates: Vec<Entity> = tree
            .locate_within_distance([point.lon, point.lat], window_degrees * window_degrees)
            .filter(|spatial| {
                let candidate_point = GeoPoint::new(spatial.position[1], spatial.position[0]);
                haversine_meters(point, candidate_point) <= radius_meters
            })
            .map(|spatial| spatial.entity.clone())
            .collect();

        // the tree iterates in arbitrary order; sort so repeated runs hand
        // the scorer an identical candidate ordering
        candidates.sort_by(|a, b| a.onestop_id.cmp(&b.onestop_id));

        Ok(candidates)
    }
}
