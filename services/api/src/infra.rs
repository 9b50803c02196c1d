use chrono::{NaiveDate, NaiveDateTime};
use inspection_ai::workflows::inspection::{
    CsvMappingStore, MappingStore, MappingStoreError, TradeMappingEntry,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mapping persistence chosen by configuration: a CSV file when
/// `INSPECTION_MAPPING_PATH` is set, otherwise process memory.
pub(crate) enum ConfiguredMappingStore {
    File(CsvMappingStore),
    Memory(InMemoryMappingStore),
}

impl ConfiguredMappingStore {
    pub(crate) fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(CsvMappingStore::new(path)),
            None => Self::Memory(InMemoryMappingStore::default()),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::File(store) => store.path().display().to_string(),
            Self::Memory(_) => "in-memory".to_string(),
        }
    }
}

impl MappingStore for ConfiguredMappingStore {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
        match self {
            Self::File(store) => store.load_all(),
            Self::Memory(store) => store.load_all(),
        }
    }

    fn save_all(&self, entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
        match self {
            Self::File(store) => store.save_all(entries),
            Self::Memory(store) => store.save_all(entries),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMappingStore {
    entries: Arc<Mutex<Vec<TradeMappingEntry>>>,
}

impl MappingStore for InMemoryMappingStore {
    fn load_all(&self) -> Result<Vec<TradeMappingEntry>, MappingStoreError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| MappingStoreError::Unavailable("mapping mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save_all(&self, entries: &[TradeMappingEntry]) -> Result<(), MappingStoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| MappingStoreError::Unavailable("mapping mutex poisoned".to_string()))?;
        *guard = entries.to_vec();
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`; a bare date means midnight.
pub(crate) fn parse_evaluated_at(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(at);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS"))
}
