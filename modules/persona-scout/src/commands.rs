// Subcommand bodies for the `persona` binary.
//
// Output goes to the given writer; diagnostics go through tracing.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use persona_common::ActorSource;
use tracing::info;

use crate::batch::BatchRunner;
use crate::composer::{Composer, Composition};
use crate::reconciler::Reconciler;
use crate::stats::{BatchStats, ReconcileReport};
use crate::store::CollectionStore;

/// Compose one page and write it, or its decode failure, as pretty JSON.
pub async fn extract(composer: &Composer, url: &str, model: &str, out: &mut impl Write) -> Result<()> {
    let json = match composer.compose(url, model).await? {
        Composition::Record(record) => serde_json::to_string_pretty(&record)?,
        Composition::Undecodable(failure) => serde_json::to_string_pretty(&failure)?,
    };
    writeln!(out, "{json}")?;
    Ok(())
}

/// Read a batch input file: a JSON array of `{"link", "agency"}`.
pub fn load_sources(path: &Path) -> Result<Vec<ActorSource>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of sources", path.display()))
}

pub async fn batch(
    composer: &Composer,
    store: &dyn CollectionStore,
    sources: &[ActorSource],
    model: &str,
    force: bool,
    out: &mut impl Write,
) -> Result<BatchStats> {
    info!(collection = %store.location(), model, force, "Batch target");
    let stats = BatchRunner::new(composer, store, model)
        .force(force)
        .run(sources)
        .await?;
    writeln!(out, "{stats}")?;
    Ok(stats)
}

/// Reconcile the collection. A missing, corrupt or empty collection is not an
/// error; it is logged and nothing is written.
pub async fn reconcile(
    composer: &Composer,
    store: &dyn CollectionStore,
    model: &str,
    out: &mut impl Write,
) -> Result<Option<ReconcileReport>> {
    info!(collection = %store.location(), model, "Reconcile target");
    let report = Reconciler::new(composer, store, model).run().await?;
    match &report {
        Some(report) => writeln!(out, "{report}")?,
        None => info!("Nothing to reconcile"),
    }
    Ok(report)
}
