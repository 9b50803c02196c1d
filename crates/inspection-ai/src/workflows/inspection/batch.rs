use super::domain::{InspectionRecord, PropertyId};
use super::evaluation::{OverallStatus, PropertyContext, ReadinessEvaluator, SettlementVerdict};
use super::normalizer::{NormalizedBatch, RowError};
use super::report::{ReportModel, ReportModelBuilder, SkippedRowView};
use super::unmapped::{UnmappedTerm, UnmappedTermReport};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Fatal problem with one property; the rest of the batch is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyEvaluationError {
    #[error(
        "property {property_id} has no usable inspection records ({skipped_rows} skipped row(s), {unresolved_records} unmapped record(s))"
    )]
    NoUsableRecords {
        property_id: PropertyId,
        skipped_rows: usize,
        unresolved_records: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PropertyOutcome {
    Evaluated {
        #[serde(skip)]
        verdict: Box<SettlementVerdict>,
        report: Box<ReportModel>,
    },
    Failed {
        property_id: PropertyId,
        error: PropertyEvaluationError,
        message: String,
    },
}

impl PropertyOutcome {
    pub fn property_id(&self) -> &PropertyId {
        match self {
            Self::Evaluated { verdict, .. } => &verdict.property_id,
            Self::Failed { property_id, .. } => property_id,
        }
    }

    pub fn verdict(&self) -> Option<&SettlementVerdict> {
        match self {
            Self::Evaluated { verdict, .. } => Some(verdict.as_ref()),
            Self::Failed { .. } => None,
        }
    }

    pub fn report(&self) -> Option<&ReportModel> {
        match self {
            Self::Evaluated { report, .. } => Some(report.as_ref()),
            Self::Failed { .. } => None,
        }
    }
}

/// Batch-level tallies shown alongside the per-property reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows_read: usize,
    pub records: usize,
    pub skipped_rows: usize,
    pub properties: usize,
    pub ready: usize,
    pub not_ready: usize,
    pub incomplete: usize,
    pub failed: usize,
    pub unmapped_terms: Vec<UnmappedTerm>,
    /// Rejected rows that could not be attributed to a property.
    pub unattributed_rows: Vec<SkippedRowView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEvaluation {
    pub summary: BatchSummary,
    pub properties: Vec<PropertyOutcome>,
}

impl BatchEvaluation {
    pub fn property(&self, property_id: &str) -> Option<&PropertyOutcome> {
        self.properties
            .iter()
            .find(|outcome| outcome.property_id().as_str() == property_id)
    }
}

/// Evaluate every property of a normalized batch. Properties share nothing but the
/// read-only inputs, so they are judged in parallel; results come back in
/// property-id order.
pub fn evaluate_batch(
    batch: &NormalizedBatch,
    evaluator: &ReadinessEvaluator,
    evaluated_at: NaiveDateTime,
) -> BatchEvaluation {
    let mut grouped: BTreeMap<PropertyId, PropertyInputs<'_>> = BTreeMap::new();
    for record in &batch.records {
        grouped
            .entry(record.property_id.clone())
            .or_default()
            .records
            .push(record.clone());
    }
    let mut unattributed_rows = Vec::new();
    for row in &batch.errors {
        match &row.property_id {
            Some(property_id) => grouped
                .entry(property_id.clone())
                .or_default()
                .skipped
                .push(row),
            None => unattributed_rows.push(SkippedRowView::from(row)),
        }
    }

    let properties: Vec<PropertyOutcome> = grouped
        .into_par_iter()
        .map(|(property_id, inputs)| evaluate_property(property_id, inputs, evaluator, evaluated_at))
        .collect();

    let mut summary = BatchSummary {
        rows_read: batch.rows_read,
        records: batch.records.len(),
        skipped_rows: batch.errors.len(),
        properties: properties.len(),
        ready: 0,
        not_ready: 0,
        incomplete: 0,
        failed: 0,
        unmapped_terms: batch.unmapped.terms(),
        unattributed_rows,
    };
    for outcome in &properties {
        match outcome.verdict().map(|verdict| verdict.overall_status) {
            Some(OverallStatus::Ready) => summary.ready += 1,
            Some(OverallStatus::NotReady) => summary.not_ready += 1,
            Some(OverallStatus::Incomplete) => summary.incomplete += 1,
            None => summary.failed += 1,
        }
    }

    info!(
        properties = summary.properties,
        ready = summary.ready,
        not_ready = summary.not_ready,
        incomplete = summary.incomplete,
        failed = summary.failed,
        "inspection batch evaluated"
    );

    BatchEvaluation {
        summary,
        properties,
    }
}

#[derive(Default)]
struct PropertyInputs<'a> {
    records: Vec<InspectionRecord>,
    skipped: Vec<&'a RowError>,
}

fn evaluate_property(
    property_id: PropertyId,
    inputs: PropertyInputs<'_>,
    evaluator: &ReadinessEvaluator,
    evaluated_at: NaiveDateTime,
) -> PropertyOutcome {
    let resolved = inputs.records.iter().filter(|record| record.is_resolved()).count();
    if resolved == 0 {
        let error = PropertyEvaluationError::NoUsableRecords {
            property_id: property_id.clone(),
            skipped_rows: inputs.skipped.len(),
            unresolved_records: inputs.records.len(),
        };
        warn!(%property_id, %error, "property evaluation failed");
        return PropertyOutcome::Failed {
            property_id,
            message: error.to_string(),
            error,
        };
    }

    let context = PropertyContext::from_records(property_id, &inputs.records, evaluated_at);
    let verdict = evaluator.evaluate(&context, &inputs.records);

    let skipped: Vec<RowError> = inputs.skipped.into_iter().cloned().collect();
    let unmapped = UnmappedTermReport::from_records(&inputs.records);
    let report = ReportModelBuilder::new()
        .with_records(&inputs.records)
        .with_skipped_rows(&skipped)
        .with_defect_bands(evaluator.policy().defect_bands)
        .build(&verdict, &unmapped);

    PropertyOutcome::Evaluated {
        verdict: Box::new(verdict),
        report: Box::new(report),
    }
}
