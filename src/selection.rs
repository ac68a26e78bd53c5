// Reduces a scored candidate set to a single best match

use crate::scoring::MatchResult;

/// Picks the best match from a scored set. Max-by-score; on a tie an exact
/// identifier match beats a non-exact one, otherwise the earliest result
/// stands. Empty input yields None.
///
/// The strict comparison keeps selection deterministic for repeated runs
/// over the same candidate ordering.
pub fn select_best<'a>(results: &[MatchResult<'a>]) -> Option<MatchResult<'a>> {
    let mut best: Option<MatchResult<'a>> = None;

    for result in results {
        let replace = match &best {
            None => true,
            Some(current) => {
                result.score > current.score
                    || (result.score == current.score && result.exact && !current.exact)
            }
        };

        if replace {
            best = Some(*result);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Entity, EntityKind};

    fn stop(onestop_id: &str) -> Entity {
        Entity::new(EntityKind::Stop, onestop_id, "Stop", None)
    }

    fn result<'a>(entity: &'a Entity, score: f64, exact: bool) -> MatchResult<'a> {
        MatchResult {
            entity,
            score,
            exact,
        }
    }

    #[test]
    fn test_empty_set_selects_none() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_max_score_wins() {
        let e1 = stop("s-a");
        let e2 = stop("s-b");
        let results = vec![result(&e1, 0.4, false), result(&e2, 0.8, false)];

        let best = select_best(&results).unwrap();
        assert_eq!(best.entity.onestop_id, "s-b");
    }

    #[test]
    fn test_tie_prefers_exact_match() {
        let e1 = stop("s-a");
        let e2 = stop("s-b");
        let results = vec![result(&e1, 0.9, false), result(&e2, 0.9, true)];

        let best = select_best(&results).unwrap();
        assert_eq!(best.entity.onestop_id, "s-b");
        assert!(best.exact);
    }

    #[test]
    fn test_tie_without_exact_keeps_first_encountered() {
        let e1 = stop("s-a");
        let e2 = stop("s-b");
        let results = vec![result(&e1, 0.9, false), result(&e2, 0.9, false)];

        let best = select_best(&results).unwrap();
        assert_eq!(best.entity.onestop_id, "s-a");
    }

    #[test]
    fn test_exact_match_not_displaced_by_equal_score() {
        let e1 = stop("s-a");
        let e2 = stop("s-b");
        let results = vec![result(&e1, 1.0, true), result(&e2, 1.0, false)];

        let best = select_best(&results).unwrap();
        assert_eq!(best.entity.onestop_id, "s-a");
    }

    #[test]
    fn test_selection_is_deterministic_across_runs() {
        let entities: Vec<Entity> = (0..5).map(|i| stop(&format!("s-{}", i))).collect();
        let results: Vec<MatchResult> = entities
            .iter()
            .map(|e| result(e, 0.75, false))
            .collect();

        let first = select_best(&results).unwrap().entity.onestop_id.clone();
        for _ in 0..10 {
            assert_eq!(select_best(&results).unwrap().entity.onestop_id, first);
        }
    }
}
