use super::domain::{InspectionRecord, PropertyId, Resolution, Severity};
use super::mapping::{TradeMappingRegistry, UnmappedLabel};
use super::parser::{parse_timestamp, RawInspectionRow};
use super::unmapped::UnmappedTermReport;
use serde::Serialize;
use tracing::{debug, info};

/// Case-folds and collapses whitespace so labels compare the same way everywhere.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Why a row could not become an inspection record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },
    #[error("severity '{value}' is not one of Minor, Major, Critical")]
    InvalidSeverity { value: String },
    #[error("inspected_at '{value}' is not a recognized timestamp")]
    MalformedTimestamp { value: String },
    #[error("row could not be read: {detail}")]
    MalformedRow { detail: String },
}

impl RecordError {
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "Missing Field",
            Self::InvalidSeverity { .. } => "Invalid Severity",
            Self::MalformedTimestamp { .. } => "Malformed Timestamp",
            Self::MalformedRow { .. } => "Malformed Row",
        }
    }
}

/// A rejected row, kept so the batch summary and report appendix can disclose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub line: u64,
    pub property_id: Option<PropertyId>,
    pub error: RecordError,
}

/// A normalized record plus the failed lookup, if any, for the caller to tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub record: InspectionRecord,
    pub unmapped: Option<UnmappedLabel>,
}

/// Output of one normalization run: every row ends up in exactly one of
/// `records` or `errors`.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub rows_read: usize,
    pub records: Vec<InspectionRecord>,
    pub errors: Vec<RowError>,
    pub unmapped: UnmappedTermReport,
}

impl NormalizedBatch {
    pub fn resolved_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_resolved()).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.records.len() - self.resolved_count()
    }
}

pub struct RecordNormalizer<'a> {
    registry: &'a TradeMappingRegistry,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(registry: &'a TradeMappingRegistry) -> Self {
        Self { registry }
    }

    pub fn normalize(&self, row: &RawInspectionRow) -> Result<NormalizedRow, RecordError> {
        if let Some(detail) = &row.malformed {
            return Err(RecordError::MalformedRow {
                detail: detail.clone(),
            });
        }
        let property_id = required(&row.property_id, "property_id")?;
        let raw_trade_label = required(&row.raw_trade_label, "raw_trade_label")?;
        let finding_code = required(&row.finding_code, "finding_code")?;
        let severity_raw = required(&row.severity, "severity")?;

        let severity = Severity::parse(severity_raw).ok_or_else(|| RecordError::InvalidSeverity {
            value: severity_raw.to_string(),
        })?;

        let inspected_at = match row.inspected_at.as_deref() {
            Some(value) => Some(parse_timestamp(value).ok_or_else(|| {
                RecordError::MalformedTimestamp {
                    value: value.to_string(),
                }
            })?),
            None => None,
        };

        let (canonical_trade, resolution, unmapped) = match self.registry.lookup(raw_trade_label) {
            Ok(trade) => (Some(trade), Resolution::Resolved, None),
            Err(unmapped) => (None, Resolution::Unresolved, Some(unmapped)),
        };

        let record = InspectionRecord {
            line: row.line,
            property_id: PropertyId(property_id.to_string()),
            jurisdiction: row.jurisdiction.clone(),
            raw_trade_label: raw_trade_label.to_string(),
            canonical_trade,
            finding_code: finding_code.to_string(),
            severity,
            description: row.description.clone().unwrap_or_default(),
            inspected_at,
            resolution,
        };

        Ok(NormalizedRow { record, unmapped })
    }

    /// Normalize every row independently; one bad row never stops the batch.
    pub fn normalize_batch(&self, rows: &[RawInspectionRow]) -> NormalizedBatch {
        let mut batch = NormalizedBatch {
            rows_read: rows.len(),
            ..NormalizedBatch::default()
        };

        for row in rows {
            match self.normalize(row) {
                Ok(NormalizedRow { record, unmapped }) => {
                    if let Some(label) = unmapped {
                        batch.unmapped.record(&label);
                    }
                    batch.records.push(record);
                }
                Err(error) => {
                    debug!(line = row.line, %error, "inspection row skipped");
                    batch.errors.push(RowError {
                        line: row.line,
                        property_id: row.property_id.clone().map(PropertyId),
                        error,
                    });
                }
            }
        }

        info!(
            rows = batch.rows_read,
            records = batch.records.len(),
            skipped = batch.errors.len(),
            unmapped_terms = batch.unmapped.len(),
            "inspection batch normalized"
        );
        batch
    }
}

fn required<'r>(value: &'r Option<String>, field: &'static str) -> Result<&'r str, RecordError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(RecordError::MissingField { field })
}
