// Retry reconciliation over the persisted collection.
//
// Each pass first snapshots the indices it will touch, then re-composes those
// entries one at a time. A recovered entry replaces the old one at the same
// index and the whole collection is checkpointed before the next entry is
// attempted.

use anyhow::Result;
use persona_common::{ActorEntry, EntryState};
use tracing::{error, info, warn};

use crate::composer::{Composer, Composition};
use crate::stats::{PassStats, ReconcileReport};
use crate::store::{CollectionStore, Loaded};

pub struct Reconciler<'a> {
    composer: &'a Composer,
    store: &'a dyn CollectionStore,
    model: String,
}

impl<'a> Reconciler<'a> {
    /// `model` is the fallback model used for every retry.
    pub fn new(composer: &'a Composer, store: &'a dyn CollectionStore, model: impl Into<String>) -> Self {
        Self {
            composer,
            store,
            model: model.into(),
        }
    }

    /// Load the collection and run both passes.
    ///
    /// Returns `None` when there was nothing to reconcile (file missing,
    /// unreadable as JSON, or empty). Only store I/O failures are errors.
    pub async fn run(&self) -> Result<Option<ReconcileReport>> {
        let mut entries = match self.store.load()? {
            Loaded::Missing => {
                warn!(location = %self.store.location(), "Collection not found, nothing to retry");
                return Ok(None);
            }
            Loaded::Corrupt(reason) => {
                error!(location = %self.store.location(), reason = reason.as_str(), "Collection is corrupted, nothing to retry");
                return Ok(None);
            }
            Loaded::Entries(entries) if entries.is_empty() => {
                info!(location = %self.store.location(), "Collection is empty, nothing to retry");
                return Ok(None);
            }
            Loaded::Entries(entries) => entries,
        };

        info!(total = entries.len(), model = self.model.as_str(), "Starting retry run");

        let mut dirty = false;
        let failed = self.retry_failed(&mut entries, &mut dirty).await?;
        let incomplete = self.retry_incomplete(&mut entries, &mut dirty).await?;

        // Error notes on entries that were not recovered have not been
        // checkpointed yet.
        if dirty {
            self.store.save(&entries)?;
        }

        Ok(Some(ReconcileReport {
            total: entries.len(),
            failed,
            incomplete,
        }))
    }

    /// Pass 1: re-drive every failed entry.
    pub async fn retry_failed(&self, entries: &mut [ActorEntry], dirty: &mut bool) -> Result<PassStats> {
        let targets = indices_in_state(entries, EntryState::Failed);
        let mut stats = PassStats {
            attempted: targets.len(),
            ..PassStats::default()
        };
        info!(count = targets.len(), "Failed entries to retry");

        for (n, &index) in targets.iter().enumerate() {
            let link = entries[index].link.clone();
            let agency = entries[index].agency_or_unknown().to_string();
            info!(
                index,
                progress = %format!("{}/{}", n + 1, targets.len()),
                link = link.as_str(),
                agency = agency.as_str(),
                "Retrying failed entry"
            );

            match self.composer.compose(&link, &self.model).await {
                Ok(Composition::Record(record)) => match ActorEntry::succeeded(&record, &link, &agency) {
                    Ok(entry) => {
                        info!(index, name = %record.identity.name, "Recovered failed entry");
                        entries[index] = entry;
                        self.store.save(entries)?;
                        stats.recovered += 1;
                        continue;
                    }
                    Err(e) => entries[index].mark_failed(e.to_string(), None),
                },
                Ok(Composition::Undecodable(failure)) => {
                    warn!(index, link = link.as_str(), error = %failure, "Retry still undecodable");
                    entries[index].mark_failed(failure.error, Some(failure.raw_response));
                }
                Err(e) => {
                    warn!(index, link = link.as_str(), error = %e, "Retry failed");
                    entries[index].mark_failed(e.to_string(), None);
                }
            }
            *dirty = true;
            stats.still_defective += 1;
        }

        info!(recovered = stats.recovered, still_failed = stats.still_defective, "Failed-entry pass complete");
        Ok(stats)
    }

    /// Pass 2: re-drive every successful entry whose name came back empty.
    /// Never downgrades an entry's status.
    pub async fn retry_incomplete(&self, entries: &mut [ActorEntry], dirty: &mut bool) -> Result<PassStats> {
        let targets = indices_in_state(entries, EntryState::Incomplete);
        let mut stats = PassStats {
            attempted: targets.len(),
            ..PassStats::default()
        };
        info!(count = targets.len(), "Missing-name entries to retry");

        for (n, &index) in targets.iter().enumerate() {
            let link = entries[index].link.clone();
            let agency = entries[index].agency_or_unknown().to_string();
            info!(
                index,
                progress = %format!("{}/{}", n + 1, targets.len()),
                link = link.as_str(),
                agency = agency.as_str(),
                "Retrying missing-name entry"
            );

            match self.composer.compose(&link, &self.model).await {
                Ok(Composition::Record(record)) if !record.name().is_known() => {
                    info!(index, link = link.as_str(), "Name still missing");
                }
                Ok(Composition::Record(record)) => match ActorEntry::succeeded(&record, &link, &agency) {
                    Ok(entry) => {
                        info!(index, name = %record.identity.name, "Recovered missing-name entry");
                        entries[index] = entry;
                        self.store.save(entries)?;
                        stats.recovered += 1;
                        continue;
                    }
                    Err(e) => {
                        entries[index].note_error(e.to_string(), None);
                        *dirty = true;
                    }
                },
                Ok(Composition::Undecodable(failure)) => {
                    warn!(index, link = link.as_str(), error = %failure, "Retry undecodable");
                    entries[index].note_error(failure.error, Some(failure.raw_response));
                    *dirty = true;
                }
                Err(e) => {
                    warn!(index, link = link.as_str(), error = %e, "Retry failed");
                    entries[index].note_error(e.to_string(), None);
                    *dirty = true;
                }
            }
            stats.still_defective += 1;
        }

        info!(recovered = stats.recovered, still_missing = stats.still_defective, "Missing-name pass complete");
        Ok(stats)
    }
}

fn indices_in_state(entries: &[ActorEntry], state: EntryState) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.state() == state)
        .map(|(index, _)| index)
        .collect()
}
