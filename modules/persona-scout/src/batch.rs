use anyhow::{bail, Result};
use persona_common::{ActorEntry, ActorSource, EntryState};
use tracing::{info, warn};

use crate::composer::{Composer, Composition};
use crate::stats::BatchStats;
use crate::store::{CollectionStore, Loaded};

/// Composes a list of source pages into the persisted collection.
///
/// Each outcome is upserted by link and checkpointed before the next source
/// is fetched. Per-record failures end up in the record, never in the result.
pub struct BatchRunner<'a> {
    composer: &'a Composer,
    store: &'a dyn CollectionStore,
    model: String,
    force: bool,
}

impl<'a> BatchRunner<'a> {
    pub fn new(composer: &'a Composer, store: &'a dyn CollectionStore, model: impl Into<String>) -> Self {
        Self {
            composer,
            store,
            model: model.into(),
            force: false,
        }
    }

    /// Re-extract sources whose link already has a good record.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub async fn run(&self, sources: &[ActorSource]) -> Result<BatchStats> {
        let mut entries = match self.store.load()? {
            Loaded::Missing => Vec::new(),
            Loaded::Entries(entries) => entries,
            // Never overwrite a collection we could not read.
            Loaded::Corrupt(reason) => bail!(
                "Collection at {} is not valid JSON ({reason}); refusing to overwrite it",
                self.store.location()
            ),
        };

        let mut stats = BatchStats::default();
        info!(sources = sources.len(), existing = entries.len(), model = self.model.as_str(), "Starting batch run");

        for (n, source) in sources.iter().enumerate() {
            let position = entries.iter().position(|entry| entry.link == source.link);

            if !self.force {
                if let Some(index) = position {
                    if entries[index].state() == EntryState::Ok {
                        info!(link = source.link.as_str(), "Already extracted, skipping");
                        stats.skipped += 1;
                        continue;
                    }
                }
            }

            info!(
                progress = %format!("{}/{}", n + 1, sources.len()),
                link = source.link.as_str(),
                agency = source.agency_or_unknown(),
                "Extracting"
            );
            let entry = self.extract(source).await;
            if entry.state() == EntryState::Failed {
                stats.failed += 1;
            } else {
                stats.succeeded += 1;
            }
            stats.processed += 1;

            match position {
                Some(index) => entries[index] = entry,
                None => entries.push(entry),
            }
            self.store.save(&entries)?;
        }

        Ok(stats)
    }

    async fn extract(&self, source: &ActorSource) -> ActorEntry {
        let link = source.link.as_str();
        let agency = source.agency_or_unknown();

        match self.composer.compose(link, &self.model).await {
            Ok(Composition::Record(record)) => ActorEntry::succeeded(&record, link, agency)
                .unwrap_or_else(|e| ActorEntry::failed(link, agency, e.to_string(), None)),
            Ok(Composition::Undecodable(failure)) => {
                warn!(link, error = %failure, "Identity answer undecodable");
                ActorEntry::failed(link, agency, failure.error, Some(failure.raw_response))
            }
            Err(e) => {
                warn!(link, error = %e, "Extraction failed");
                ActorEntry::failed(link, agency, e.to_string(), None)
            }
        }
    }
}
