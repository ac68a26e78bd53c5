// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// In-memory representation of feed entities as produced by the feed parser

use compact_str::CompactString;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

/// All feed-sourced fields that are not part of identity or geometry.
/// Merging replaces this map wholesale, it is never deep-merged.
pub type AttributeBag = serde_json::Map<String, Value>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Operator,
    Stop,
    Route,
}

impl EntityKind {
    /// Prefix of Onestop IDs for this kind, e.g. `s-9q9p1bbq5-mainst`
    pub fn onestop_prefix(&self) -> &'static str {
        match self {
            EntityKind::Operator => "o-",
            EntityKind::Stop => "s-",
            EntityKind::Route => "r-",
        }
    }
}

/// WGS-84 coordinate
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub onestop_id: CompactString,
    pub name: String,
    pub point: Option<GeoPoint>,
    #[serde(default)]
    pub data: AttributeBag,
}

impl Entity {
    pub fn new(
        kind: EntityKind,
        onestop_id: impl Into<CompactString>,
        name: impl Into<String>,
        point: Option<GeoPoint>,
    ) -> Entity {
        Entity {
            kind,
            onestop_id: onestop_id.into(),
            name: name.into(),
            point,
            data: AttributeBag::new(),
        }
    }

    pub fn with_data(mut self, data: AttributeBag) -> Entity {
        self.data = data;
        self
    }
}

/// One operator together with the stops and routes it owns, as parsed from a
/// single feed. Reconciliation and persistence both walk the unit in
/// operator, stops, routes order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedUnit {
    pub operator: Entity,
    #[serde(default)]
    pub stops: Vec<Entity>,
    #[serde(default)]
    pub routes: Vec<Entity>,
}

impl FeedUnit {
    pub fn entity_count(&self) -> usize {
        1 + self.stops.len() + self.routes.len()
    }
}
