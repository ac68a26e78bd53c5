// Copyright Catenary Transit Initiatives
// Merge policy: decides identity merge, threshold merge or no match

use crate::comparators::identifier_equal;
use crate::entities::{Entity, EntityKind};
use crate::scoring::MatchResult;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    IdentityMerge,
    ThresholdMerge,
    NoMatch,
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(
        "cannot merge {candidate_kind:?} '{candidate_id}' with {existing_kind:?} '{existing_id}'"
    )]
    KindMismatch {
        candidate_kind: EntityKind,
        candidate_id: CompactString,
        existing_kind: EntityKind,
        existing_id: CompactString,
    },
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// A merge triggers when the best score is strictly above this.
    pub threshold: f64,
    /// Candidate lookup radius in meters.
    pub radius_meters: f64,
}

impl Default for ReconcileConfig {
    fn default() -> ReconcileConfig {
        ReconcileConfig {
            threshold: 0.5,
            radius_meters: 100.0,
        }
    }
}

/// Applies the merge policy to the best match for one candidate.
///
/// Identifier equality merges regardless of threshold. Otherwise the best
/// score must be strictly above the threshold, so a score exactly at the
/// threshold does not merge. The candidate is left untouched on NoMatch.
pub fn reconcile(
    candidate: &mut Entity,
    best: Option<MatchResult>,
    threshold: f64,
) -> Result<Outcome, ReconcileError> {
    let best = match best {
        Some(best) => best,
        None => return Ok(Outcome::NoMatch),
    };

    let identity = best.exact || identifier_equal(candidate, best.entity);

    if identity {
        merge(candidate, best.entity)?;
        return Ok(Outcome::IdentityMerge);
    }

    if best.score > threshold {
        merge(candidate, best.entity)?;
        return Ok(Outcome::ThresholdMerge);
    }

    Ok(Outcome::NoMatch)
}

/// Replaces the candidate's attribute bag with the datastore entity's. The
/// datastore entity is authoritative after a merge; the candidate keeps its
/// own identifier. The existing entity is never mutated, and re-merging the
/// same pair is a no-op on content.
fn merge(candidate: &mut Entity, existing: &Entity) -> Result<(), ReconcileError> {
    if candidate.kind != existing.kind {
        return Err(ReconcileError::KindMismatch {
            candidate_kind: candidate.kind,
            candidate_id: candidate.onestop_id.clone(),
            existing_kind: existing.kind,
            existing_id: existing.onestop_id.clone(),
        });
    }

    candidate.data = existing.data.clone();
    Ok(())
}
