// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Reconciles a freshly parsed feed unit against a datastore snapshot

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use yarrow::batch::{DatastoreError, EntityWriter, persist_feed, reconcile_feed};
use yarrow::entities::{Entity, FeedUnit};
use yarrow::reconcile::ReconcileConfig;
use yarrow::scoring::WeightedScorer;
use yarrow::spatial_index::SpatialEntityIndex;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parsed feed unit (operator + stops + routes) as JSON
    #[arg(long)]
    feed: PathBuf,
    /// Datastore snapshot: JSON array of known entities
    #[arg(long)]
    datastore: PathBuf,
    /// Where to write the reconciled entities; stdout if omitted
    #[arg(long)]
    out: Option<PathBuf>,
    /// Merge when the best score is strictly above this
    #[arg(long, default_value_t = 0.5)]
    threshold: f64,
    /// Candidate search radius in meters
    #[arg(long, default_value_t = 100.0)]
    radius_meters: f64,
}

/// Collects updated entities and writes them out as a JSON snapshot.
struct JsonSnapshotWriter {
    entities: Vec<Entity>,
}

impl EntityWriter for JsonSnapshotWriter {
    fn update_entities(&mut self, entities: &[Entity]) -> Result<(), DatastoreError> {
        self.entities.extend(entities.iter().cloned());
        Ok(())
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let feed_file = File::open(&args.feed)
        .with_context(|| format!("failed to open feed file {}", args.feed.display()))?;
    let unit: FeedUnit = serde_json::from_reader(BufReader::new(feed_file))
        .with_context(|| format!("failed to parse feed unit from {}", args.feed.display()))?;

    let snapshot_file = File::open(&args.datastore).with_context(|| {
        format!(
            "failed to open datastore snapshot {}",
            args.datastore.display()
        )
    })?;
    let snapshot: Vec<Entity> = serde_json::from_reader(BufReader::new(snapshot_file))
        .with_context(|| {
            format!(
                "failed to parse datastore snapshot from {}",
                args.datastore.display()
            )
        })?;

    info!(
        "loaded feed unit for {} with {} stops and {} routes",
        unit.operator.onestop_id,
        unit.stops.len(),
        unit.routes.len()
    );

    let index = SpatialEntityIndex::new(snapshot);
    info!(
        "indexed {} datastore entities ({} without geometry skipped)",
        index.len(),
        index.skipped_no_geometry()
    );

    let config = ReconcileConfig {
        threshold: args.threshold,
        radius_meters: args.radius_meters,
    };
    let scorer = WeightedScorer {
        radius_meters: args.radius_meters,
        ..WeightedScorer::default()
    };

    let (unit, report) = reconcile_feed(unit, &index, &scorer, &config)?;

    println!(
        "{}: {} identity merges, {} threshold merges, {} unmatched, {} lookup failures",
        unit.operator.onestop_id,
        report.identity_merges,
        report.threshold_merges,
        report.no_matches,
        report.lookup_failures
    );

    let mut writer = JsonSnapshotWriter {
        entities: Vec::new(),
    };
    persist_feed(&unit, &mut writer)
        .map_err(|e| anyhow::anyhow!("failed to persist reconciled entities: {}", e))?;

    let output = serde_json::to_string_pretty(&writer.entities)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {} entities to {}", writer.entities.len(), path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}
