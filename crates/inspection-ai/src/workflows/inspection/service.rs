use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;
use tracing::{error, info};

use super::batch::{evaluate_batch, BatchEvaluation};
use super::domain::Trade;
use super::evaluation::{ReadinessEvaluator, ReadinessPolicy};
use super::mapping::store::{MappingStore, MappingStoreError};
use super::mapping::{RegistryError, TradeMappingEntry, TradeMappingRegistry, UpsertOutcome};
use super::normalizer::{NormalizedBatch, RecordNormalizer};
use super::parser::{self, IngestError};
use super::unmapped::UnmappedTermReport;

/// Composes the mapping registry, its store and the readiness evaluator.
pub struct InspectionService<S> {
    registry: Arc<TradeMappingRegistry>,
    store: Arc<S>,
    evaluator: ReadinessEvaluator,
    /// Held from a registry edit until its snapshot is saved, so saves land in edit order.
    edits: Mutex<()>,
}

impl<S> InspectionService<S>
where
    S: MappingStore + 'static,
{
    pub fn new(registry: Arc<TradeMappingRegistry>, store: Arc<S>, policy: ReadinessPolicy) -> Self {
        Self {
            registry,
            store,
            evaluator: ReadinessEvaluator::new(policy),
            edits: Mutex::new(()),
        }
    }

    /// Build the registry from the store, seeding the standard labels when the store is empty.
    pub fn from_store(store: Arc<S>, policy: ReadinessPolicy) -> Result<Self, InspectionServiceError> {
        let entries = store.load_all()?;
        let registry = if entries.is_empty() {
            info!("mapping store empty; using standard trade labels");
            TradeMappingRegistry::standard()
        } else {
            TradeMappingRegistry::from_entries(entries)
        };
        Ok(Self::new(Arc::new(registry), store, policy))
    }

    pub fn registry(&self) -> &TradeMappingRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &ReadinessPolicy {
        self.evaluator.policy()
    }

    /// Parse and normalize an export without evaluating it.
    pub fn normalize_csv<R: Read>(&self, reader: R) -> Result<NormalizedBatch, InspectionServiceError> {
        let rows = parser::parse_rows(reader)?;
        Ok(RecordNormalizer::new(&self.registry).normalize_batch(&rows))
    }

    pub fn evaluate_csv<R: Read>(
        &self,
        reader: R,
        evaluated_at: NaiveDateTime,
    ) -> Result<BatchEvaluation, InspectionServiceError> {
        let batch = self.normalize_csv(reader)?;
        Ok(evaluate_batch(&batch, &self.evaluator, evaluated_at))
    }

    /// Labels in an export that the registry cannot resolve, for admins to map.
    pub fn unmapped_terms<R: Read>(&self, reader: R) -> Result<UnmappedTermReport, InspectionServiceError> {
        Ok(self.normalize_csv(reader)?.unmapped)
    }

    pub fn mappings(&self) -> Vec<TradeMappingEntry> {
        self.registry.entries()
    }

    pub fn upsert_mapping(
        &self,
        raw_label: &str,
        trade: Trade,
    ) -> Result<UpsertOutcome, InspectionServiceError> {
        let _edit = self.lock_edits();
        let outcome = self.registry.upsert(raw_label, trade)?;
        if outcome != UpsertOutcome::Unchanged {
            self.persist()?;
        }
        Ok(outcome)
    }

    pub fn deactivate_mapping(&self, raw_label: &str) -> Result<(), InspectionServiceError> {
        let _edit = self.lock_edits();
        self.registry.deactivate(raw_label)?;
        self.persist()
    }

    fn lock_edits(&self) -> MutexGuard<'_, ()> {
        self.edits.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Callers hold the edit lock.
    fn persist(&self) -> Result<(), InspectionServiceError> {
        self.store.save_all(&self.registry.entries()).map_err(|err| {
            error!(%err, "trade mappings changed in memory but were not saved");
            InspectionServiceError::Store(err)
        })
    }
}

/// Error raised by the inspection service.
#[derive(Debug, thiserror::Error)]
pub enum InspectionServiceError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] MappingStoreError),
}
