// Copyright Catenary Transit Initiatives
// Batch reconciliation of a parsed feed unit against the datastore

use crate::entities::{Entity, EntityKind, FeedUnit, GeoPoint};
use crate::reconcile::{Outcome, ReconcileConfig, ReconcileError, reconcile};
use crate::scoring::{MatchScorer, score_all};
use crate::selection::select_best;
use log::{debug, info, warn};
use rayon::prelude::*;

pub type DatastoreError = Box<dyn std::error::Error + Send + Sync>;

/// Spatial candidate query against the datastore. Implementations return
/// entities of the requested kind within the radius; order is unspecified
/// and the result may be empty.
pub trait CandidateLookup {
    fn find_candidates(
        &self,
        kind: EntityKind,
        point: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<Entity>, DatastoreError>;
}

/// Persists reconciled entities. Failure semantics belong to the implementor.
pub trait EntityWriter {
    fn update_entities(&mut self, entities: &[Entity]) -> Result<(), DatastoreError>;
}

/// One row of batch output: the candidate after reconciliation, what
/// happened to it, and the lookup error if its candidate query failed.
#[derive(Clone, Debug, Serialize)]
pub struct ReconciledEntity {
    pub entity: Entity,
    pub outcome: Outcome,
    pub lookup_error: Option<String>,
}

/// Per-outcome tallies for one reconciled feed unit.
#[derive(Copy, Clone, Debug, Default, Serialize)]
pub struct FeedReport {
    pub identity_merges: usize,
    pub threshold_merges: usize,
    pub no_matches: usize,
    pub lookup_failures: usize,
}

impl FeedReport {
    fn record(&mut self, row: &ReconciledEntity) {
        match row.outcome {
            Outcome::IdentityMerge => self.identity_merges += 1,
            Outcome::ThresholdMerge => self.threshold_merges += 1,
            Outcome::NoMatch => self.no_matches += 1,
        }
        if row.lookup_error.is_some() {
            self.lookup_failures += 1;
        }
    }
}

/// Runs one candidate through the full pipeline: lookup, score, select,
/// merge. A failed lookup is reported on the row instead of propagating, so
/// one unreachable entity does not poison the batch. Entities without a
/// point cannot be searched spatially and pass through unchanged.
pub fn reconcile_entity(
    mut entity: Entity,
    lookup: &impl CandidateLookup,
    scorer: &impl MatchScorer,
    config: &ReconcileConfig,
) -> Result<ReconciledEntity, ReconcileError> {
    debug!("looking for {}: {}", entity.onestop_id, entity.name);

    let point = match entity.point {
        Some(point) => point,
        None => {
            debug!("{} has no geometry, skipping search", entity.onestop_id);
            return Ok(ReconciledEntity {
                entity,
                outcome: Outcome::NoMatch,
                lookup_error: None,
            });
        }
    };

    let candidates = match lookup.find_candidates(entity.kind, point, config.radius_meters) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("candidate lookup failed for {}: {}", entity.onestop_id, e);
            return Ok(ReconciledEntity {
                entity,
                outcome: Outcome::NoMatch,
                lookup_error: Some(e.to_string()),
            });
        }
    };

    let results = score_all(&entity, &candidates, scorer);
    let best = select_best(&results);

    match best {
        Some(best) => info!(
            "{} -> {}: score {:.2}{}",
            entity.onestop_id,
            best.entity.onestop_id,
            best.score,
            if best.exact { ", identifier match" } else { "" }
        ),
        None => info!("{} -> no result", entity.onestop_id),
    }

    let outcome = reconcile(&mut entity, best, config.threshold)?;

    Ok(ReconciledEntity {
        entity,
        outcome,
        lookup_error: None,
    })
}

/// Reconciles a batch of entities in input order. Lookup failures are
/// isolated per entity; a kind mismatch during merge is a contract violation
/// and aborts the whole batch.
pub fn reconcile_all(
    entities: Vec<Entity>,
    lookup: &impl CandidateLookup,
    scorer: &impl MatchScorer,
    config: &ReconcileConfig,
) -> Result<Vec<ReconciledEntity>, ReconcileError> {
    entities
        .into_iter()
        .map(|entity| reconcile_entity(entity, lookup, scorer, config))
        .collect()
}

/// Parallel variant of [`reconcile_all`]. Entities are independent of each
/// other, only the stages within one entity's pipeline are ordered, so they
/// fan out across the rayon pool. Output order still matches input order.
pub fn reconcile_all_par<L, S>(
    entities: Vec<Entity>,
    lookup: &L,
    scorer: &S,
    config: &ReconcileConfig,
) -> Result<Vec<ReconciledEntity>, ReconcileError>
where
    L: CandidateLookup + Sync,
    S: MatchScorer + Sync,
{
    entities
        .into_par_iter()
        .map(|entity| reconcile_entity(entity, lookup, scorer, config))
        .collect()
}

/// Reconciles a whole feed unit: the operator, then its stops, then its
/// routes. Returns the merged unit and the per-outcome tallies.
pub fn reconcile_feed(
    unit: FeedUnit,
    lookup: &impl CandidateLookup,
    scorer: &impl MatchScorer,
    config: &ReconcileConfig,
) -> Result<(FeedUnit, FeedReport), ReconcileError> {
    info!(
        "reconciling operator {} ({} stops, {} routes)",
        unit.operator.onestop_id,
        unit.stops.len(),
        unit.routes.len()
    );

    let mut report = FeedReport::default();

    let operator_row = reconcile_entity(unit.operator, lookup, scorer, config)?;
    report.record(&operator_row);

    let stop_rows = reconcile_all(unit.stops, lookup, scorer, config)?;
    let route_rows = reconcile_all(unit.routes, lookup, scorer, config)?;
    for row in stop_rows.iter().chain(route_rows.iter()) {
        report.record(row);
    }

    let unit = FeedUnit {
        operator: operator_row.entity,
        stops: stop_rows.into_iter().map(|row| row.entity).collect(),
        routes: route_rows.into_iter().map(|row| row.entity).collect(),
    };

    info!(
        "done: {} identity merges, {} threshold merges, {} unmatched, {} lookup failures",
        report.identity_merges, report.threshold_merges, report.no_matches, report.lookup_failures
    );

    Ok((unit, report))
}

/// Hands the unit's entities to the writer in update order: the operator
/// first, then its stops and routes.
pub fn persist_feed(unit: &FeedUnit, writer: &mut impl EntityWriter) -> Result<(), DatastoreError> {
    let mut entities: Vec<Entity> = Vec::with_capacity(unit.entity_count());
    entities.push(unit.operator.clone());
    entities.extend(unit.stops.iter().cloned());
    entities.extend(unit.routes.iter().cloned());

    writer.update_entities(&entities)
}
