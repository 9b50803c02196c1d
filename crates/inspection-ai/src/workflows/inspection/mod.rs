//! Inspection reconciliation and settlement-readiness evaluation.
//!
//! Raw inspection exports are parsed, normalized against the trade mapping
//! registry, judged per trade and per property, and turned into report models
//! that downstream renderers consume.

pub mod batch;
pub mod domain;
pub mod evaluation;
pub mod mapping;
pub mod normalizer;
pub mod parser;
pub mod report;
pub mod router;
pub mod service;
pub mod unmapped;

#[cfg(test)]
mod tests;

pub use batch::{
    evaluate_batch, BatchEvaluation, BatchSummary, PropertyEvaluationError, PropertyOutcome,
};
pub use domain::{
    Identity, InspectionRecord, PropertyId, Resolution, Role, Severity, Trade, UnknownTrade,
};
pub use evaluation::{
    ConfigurationError, DefectBandThresholds, OverallStatus, PropertyContext, ReadinessEvaluator,
    ReadinessPolicy, SettlementVerdict, TradeStatus, TradeVerdict,
};
pub use mapping::store::{CsvMappingStore, MappingStore, MappingStoreError};
pub use mapping::{
    RegistryError, TradeMappingEntry, TradeMappingRegistry, UnmappedLabel, UpsertOutcome,
};
pub use normalizer::{NormalizedBatch, RecordError, RecordNormalizer, RowError};
pub use parser::{IngestError, RawInspectionRow};
pub use report::{ReportModel, ReportModelBuilder};
pub use router::inspection_router;
pub use service::{InspectionService, InspectionServiceError};
pub use unmapped::{UnmappedTerm, UnmappedTermReport};
