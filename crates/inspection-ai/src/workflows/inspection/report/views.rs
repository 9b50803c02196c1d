use super::summary::DefectBand;
use crate::workflows::inspection::domain::{PropertyId, Severity, Trade};
use crate::workflows::inspection::evaluation::{OverallStatus, TradeStatus};
use crate::workflows::inspection::unmapped::UnmappedTerm;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Document model handed to the Excel/Word renderer. Field names and the order of
/// `trade_sections` are part of the rendering contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportModel {
    pub property_id: PropertyId,
    pub jurisdiction: Option<String>,
    pub generated_at: NaiveDateTime,
    pub overall_status: OverallStatus,
    pub overall_status_label: &'static str,
    pub mapping_warning: bool,
    pub summary: ReportSummary,
    pub trade_sections: Vec<TradeSection>,
    pub appendix: ReportAppendix,
    pub raw_record_appendix: Vec<FindingRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_records: usize,
    pub resolved_records: usize,
    pub unresolved_records: usize,
    pub skipped_rows: usize,
    pub critical_findings: usize,
    pub major_findings: usize,
    pub minor_findings: usize,
    pub trades_evaluated: usize,
    pub trades_failed: usize,
    pub trades_incomplete: usize,
    pub trades_passed: usize,
    pub defect_band: DefectBand,
    pub defect_band_label: &'static str,
    pub trade_defects: Vec<TradeDefectCount>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeDefectCount {
    pub trade: Trade,
    pub trade_label: &'static str,
    pub defects: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeSection {
    pub trade: Trade,
    pub trade_label: &'static str,
    pub status: TradeStatus,
    pub status_label: &'static str,
    pub expected: bool,
    pub finding_count: usize,
    pub blocking_findings: Vec<FindingRow>,
    pub findings: Vec<FindingRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingRow {
    pub line: u64,
    pub raw_trade_label: String,
    pub trade_label: Option<&'static str>,
    pub finding_code: String,
    pub severity: Severity,
    pub severity_label: &'static str,
    pub description: String,
    pub inspected_at: Option<NaiveDateTime>,
    pub resolution_label: &'static str,
}

/// Every data gap behind the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportAppendix {
    pub unmapped_terms: Vec<UnmappedTerm>,
    pub skipped_rows: Vec<SkippedRowView>,
    pub incomplete_trades: Vec<IncompleteTradeView>,
    pub configuration_issue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRowView {
    pub line: u64,
    pub kind: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteTradeView {
    pub trade: Trade,
    pub trade_label: &'static str,
}
