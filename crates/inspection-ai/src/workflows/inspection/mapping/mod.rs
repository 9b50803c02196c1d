mod defaults;
pub mod store;

use super::domain::Trade;
use super::normalizer::normalize_label;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Registry row keyed by the normalized raw label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMappingEntry {
    pub raw_label: String,
    pub canonical_trade: Trade,
    pub active: bool,
}

/// A raw trade label with no active registry entry, returned from failed lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no active trade mapping for '{raw_label}'")]
pub struct UnmappedLabel {
    pub raw_label: String,
    pub normalized: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated { previous: Trade },
    Reactivated,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("trade mapping labels must not be empty")]
    EmptyLabel,
    #[error("no trade mapping exists for '{0}'")]
    UnknownLabel(String),
}

type Snapshot = HashMap<String, TradeMappingEntry>;

/// Raw label to canonical trade registry.
///
/// Readers clone the currently published snapshot and never block on writers for
/// longer than the pointer swap. Writers are serialized, build a fresh map from the
/// current snapshot and publish it in one step, so a lookup never observes a
/// partially applied change.
pub struct TradeMappingRegistry {
    published: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl Default for TradeMappingRegistry {
    fn default() -> Self {
        Self::from_entries(Vec::new())
    }
}

impl TradeMappingRegistry {
    /// Registry seeded with the labels commonly produced by inspection exports.
    pub fn standard() -> Self {
        let entries = defaults::STANDARD_LABELS
            .iter()
            .map(|(label, trade)| TradeMappingEntry {
                raw_label: (*label).to_string(),
                canonical_trade: *trade,
                active: true,
            })
            .collect();
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<TradeMappingEntry>) -> Self {
        Self {
            published: RwLock::new(Arc::new(build_snapshot(entries))),
            writer: Mutex::new(()),
        }
    }

    pub fn lookup(&self, raw_label: &str) -> Result<Trade, UnmappedLabel> {
        let normalized = normalize_label(raw_label);
        let snapshot = self.snapshot();
        match snapshot.get(&normalized) {
            Some(entry) if entry.active => Ok(entry.canonical_trade),
            _ => Err(UnmappedLabel {
                raw_label: raw_label.trim().to_string(),
                normalized,
            }),
        }
    }

    pub fn upsert(&self, raw_label: &str, trade: Trade) -> Result<UpsertOutcome, RegistryError> {
        let key = normalize_label(raw_label);
        if key.is_empty() {
            return Err(RegistryError::EmptyLabel);
        }

        let _writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = self.snapshot();

        let outcome = match current.get(&key) {
            Some(entry) if entry.active && entry.canonical_trade == trade => {
                return Ok(UpsertOutcome::Unchanged);
            }
            Some(entry) if entry.canonical_trade != trade => UpsertOutcome::Updated {
                previous: entry.canonical_trade,
            },
            Some(_) => UpsertOutcome::Reactivated,
            None => UpsertOutcome::Inserted,
        };

        let mut next = (*current).clone();
        next.insert(
            key.clone(),
            TradeMappingEntry {
                raw_label: key,
                canonical_trade: trade,
                active: true,
            },
        );
        self.publish(next);

        info!(raw_label = raw_label.trim(), trade = trade.label(), ?outcome, "trade mapping upserted");
        Ok(outcome)
    }

    pub fn deactivate(&self, raw_label: &str) -> Result<(), RegistryError> {
        let key = normalize_label(raw_label);
        let _writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = self.snapshot();

        let Some(entry) = current.get(&key) else {
            return Err(RegistryError::UnknownLabel(raw_label.trim().to_string()));
        };
        if !entry.active {
            return Ok(());
        }

        let mut next = (*current).clone();
        if let Some(entry) = next.get_mut(&key) {
            entry.active = false;
        }
        self.publish(next);

        info!(raw_label = raw_label.trim(), "trade mapping deactivated");
        Ok(())
    }

    /// Replace every entry at once, as when reloading from the mapping store.
    pub fn load_all(&self, entries: Vec<TradeMappingEntry>) {
        let _writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = build_snapshot(entries);
        debug!(entries = next.len(), "trade mapping registry reloaded");
        self.publish(next);
    }

    /// All entries, active and inactive, sorted by label for stable persistence.
    pub fn entries(&self) -> Vec<TradeMappingEntry> {
        let snapshot = self.snapshot();
        let mut entries: Vec<_> = snapshot.values().cloned().collect();
        entries.sort_by(|a, b| a.raw_label.cmp(&b.raw_label));
        entries
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        match self.published.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, next: Snapshot) {
        let next = Arc::new(next);
        match self.published.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

fn build_snapshot(entries: Vec<TradeMappingEntry>) -> Snapshot {
    let mut map = HashMap::with_capacity(entries.len());
    for entry in entries {
        let key = normalize_label(&entry.raw_label);
        if key.is_empty() {
            continue;
        }
        map.insert(
            key.clone(),
            TradeMappingEntry {
                raw_label: key,
                ..entry
            },
        );
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn lookup_normalizes_case_and_whitespace() {
        let registry = TradeMappingRegistry::standard();
        assert_eq!(registry.lookup("  ELECTRICAL "), Ok(Trade::Electrical));
        assert_eq!(registry.lookup("Carpentry   &  Joinery"), Ok(Trade::CarpentryAndJoinery));
    }

    #[test]
    fn lookup_is_exact_match_only() {
        let registry = TradeMappingRegistry::standard();
        let error = registry.lookup("Electricals").expect_err("no fuzzy matching");
        assert_eq!(error.raw_label, "Electricals");
        assert_eq!(error.normalized, "electricals");
    }

    #[test]
    fn upsert_reports_each_outcome() {
        let registry = TradeMappingRegistry::default();
        assert_eq!(registry.upsert("HVAC-old", Trade::Electrical), Ok(UpsertOutcome::Inserted));
        assert_eq!(registry.upsert("hvac-old", Trade::Electrical), Ok(UpsertOutcome::Unchanged));
        assert_eq!(
            registry.upsert("HVAC-OLD", Trade::Plumbing),
            Ok(UpsertOutcome::Updated {
                previous: Trade::Electrical
            })
        );
        assert_eq!(registry.lookup("hvac-old"), Ok(Trade::Plumbing));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.upsert("   ", Trade::Plumbing), Err(RegistryError::EmptyLabel));
    }

    #[test]
    fn deactivated_entries_are_kept_but_not_found() {
        let registry = TradeMappingRegistry::default();
        registry.upsert("Sparky", Trade::Electrical).expect("insert");
        registry.deactivate("SPARKY").expect("deactivate");

        assert!(registry.lookup("sparky").is_err());
        let entries = registry.entries();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].active);

        assert_eq!(registry.upsert("sparky", Trade::Electrical), Ok(UpsertOutcome::Reactivated));
        assert_eq!(registry.lookup("sparky"), Ok(Trade::Electrical));
    }

    #[test]
    fn deactivate_unknown_label_fails() {
        let registry = TradeMappingRegistry::default();
        assert_eq!(
            registry.deactivate("ghost"),
            Err(RegistryError::UnknownLabel("ghost".to_string()))
        );
    }

    #[test]
    fn concurrent_lookups_see_whole_snapshots() {
        let registry = Arc::new(TradeMappingRegistry::default());
        registry.upsert("Tiler", Trade::FlooringTiles).expect("seed");

        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for round in 0..200 {
                    let trade = if round % 2 == 0 {
                        Trade::FlooringTimber
                    } else {
                        Trade::FlooringTiles
                    };
                    registry.upsert("Tiler", trade).expect("upsert");
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let trade = registry.lookup("tiler").expect("always mapped");
                        assert!(matches!(trade, Trade::FlooringTiles | Trade::FlooringTimber));
                    }
                })
            })
            .collect();

        writer.join().expect("writer finished");
        for reader in readers {
            reader.join().expect("reader finished");
        }
    }
}
