// Copyright Catenary Transit Initiatives
// Combines attribute comparators into one similarity score per candidate pair

use crate::comparators::{identifier_equal, name_similarity, proximity};
use crate::entities::Entity;

/// Ceiling for scores computed from attribute similarity alone. A score of
/// exactly 1.0 always means the normalized identifiers were equal.
pub const MAX_ATTRIBUTE_SCORE: f64 = 0.99;

/// Outcome of scoring one candidate against one existing datastore entity.
#[derive(Copy, Clone, Debug)]
pub struct MatchResult<'a> {
    pub entity: &'a Entity,
    pub score: f64,
    pub exact: bool,
}

/// Scoring policy. The engine only requires that scores stay in [0.0, 1.0]
/// and that identifier equality short-circuits to 1.0 with `exact` set, so
/// weight tuning lives behind this trait.
pub trait MatchScorer {
    fn score<'a>(&self, candidate: &Entity, existing: &'a Entity) -> MatchResult<'a>;
}

/// Default weighting: name similarity dominates proximity, since candidates
/// are already spatially pre-filtered by the lookup radius.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightedScorer {
    pub name_weight: f64,
    pub proximity_weight: f64,
    /// Radius the proximity sub-score is normalized against, in meters.
    /// Should match the candidate lookup radius.
    pub radius_meters: f64,
}

impl Default for WeightedScorer {
    fn default() -> WeightedScorer {
        WeightedScorer {
            name_weight: 0.7,
            proximity_weight: 0.3,
            radius_meters: 100.0,
        }
    }
}

impl MatchScorer for WeightedScorer {
    fn score<'a>(&self, candidate: &Entity, existing: &'a Entity) -> MatchResult<'a> {
        if identifier_equal(candidate, existing) {
            return MatchResult {
                entity: existing,
                score: 1.0,
                exact: true,
            };
        }

        let name_sim = name_similarity(candidate, existing);
        let proximity_score = proximity(candidate, existing, self.radius_meters);

        let score = (name_sim * self.name_weight + proximity_score * self.proximity_weight)
            .clamp(0.0, MAX_ATTRIBUTE_SCORE);

        MatchResult {
            entity: existing,
            score,
            exact: false,
        }
    }
}

/// Scores one candidate against every spatial neighbor, preserving the
/// neighbor order.
pub fn score_all<'a>(
    candidate: &Entity,
    existing: &'a [Entity],
    scorer: &impl MatchScorer,
) -> Vec<MatchResult<'a>> {
    existing
        .iter()
        .map(|entity| scorer.score(candidate, entity))
        .collect()
}
