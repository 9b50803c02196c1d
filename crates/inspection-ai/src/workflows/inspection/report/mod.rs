pub mod render;
pub mod summary;
pub mod views;

pub use render::{report_filename, JsonReportRenderer, ReportFormat, ReportRenderer};
pub use summary::DefectBand;
pub use views::{
    FindingRow, IncompleteTradeView, ReportAppendix, ReportModel, ReportSummary, SkippedRowView,
    TradeDefectCount, TradeSection,
};

use super::domain::InspectionRecord;
use super::evaluation::{DefectBandThresholds, SettlementVerdict, TradeVerdict};
use super::normalizer::RowError;
use super::unmapped::UnmappedTermReport;

/// Turns a finished verdict into the renderer's document model.
///
/// The property's records and skipped rows are attached first so the raw-record
/// appendix and the skipped-row list can be disclosed; both are filtered to the
/// verdict's property, so batch-wide slices can be passed as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportModelBuilder<'a> {
    records: &'a [InspectionRecord],
    skipped_rows: &'a [RowError],
    defect_bands: DefectBandThresholds,
}

impl<'a> ReportModelBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, records: &'a [InspectionRecord]) -> Self {
        self.records = records;
        self
    }

    pub fn with_skipped_rows(mut self, skipped_rows: &'a [RowError]) -> Self {
        self.skipped_rows = skipped_rows;
        self
    }

    pub fn with_defect_bands(mut self, defect_bands: DefectBandThresholds) -> Self {
        self.defect_bands = defect_bands;
        self
    }

    pub fn build(&self, verdict: &SettlementVerdict, unmapped: &UnmappedTermReport) -> ReportModel {
        let skipped_rows: Vec<SkippedRowView> = self
            .skipped_rows
            .iter()
            .filter(|row| row.property_id.as_ref() == Some(&verdict.property_id))
            .map(SkippedRowView::from)
            .collect();

        let mut raw_records: Vec<&InspectionRecord> = self
            .records
            .iter()
            .filter(|record| record.property_id == verdict.property_id)
            .collect();
        raw_records.sort_by_key(|record| record.line);

        // Sections keep the evaluator's order.
        let trade_sections = verdict.trade_verdicts.iter().map(trade_section).collect();

        let incomplete_trades = verdict
            .incomplete_trades()
            .map(|trade| IncompleteTradeView {
                trade: trade.trade,
                trade_label: trade.trade.label(),
            })
            .collect();

        ReportModel {
            property_id: verdict.property_id.clone(),
            jurisdiction: verdict.jurisdiction.clone(),
            generated_at: verdict.generated_at,
            overall_status: verdict.overall_status,
            overall_status_label: verdict.overall_status.label(),
            mapping_warning: verdict.mapping_warning,
            summary: summary::summarize(verdict, skipped_rows.len(), &self.defect_bands),
            trade_sections,
            appendix: ReportAppendix {
                unmapped_terms: unmapped.terms(),
                skipped_rows,
                incomplete_trades,
                configuration_issue: verdict
                    .configuration_issue
                    .as_ref()
                    .map(ToString::to_string),
            },
            raw_record_appendix: raw_records.into_iter().map(finding_row).collect(),
        }
    }
}

impl From<&RowError> for SkippedRowView {
    fn from(row: &RowError) -> Self {
        Self {
            line: row.line,
            kind: row.error.kind_label(),
            detail: row.error.to_string(),
        }
    }
}

fn trade_section(verdict: &TradeVerdict) -> TradeSection {
    TradeSection {
        trade: verdict.trade,
        trade_label: verdict.trade.label(),
        status: verdict.status,
        status_label: verdict.status.label(),
        expected: verdict.expected,
        finding_count: verdict.findings.len(),
        blocking_findings: verdict.blocking_findings.iter().map(finding_row).collect(),
        findings: verdict.findings.iter().map(finding_row).collect(),
    }
}

fn finding_row(record: &InspectionRecord) -> FindingRow {
    FindingRow {
        line: record.line,
        raw_trade_label: record.raw_trade_label.clone(),
        trade_label: record.canonical_trade.map(|trade| trade.label()),
        finding_code: record.finding_code.clone(),
        severity: record.severity,
        severity_label: record.severity.label(),
        description: record.description.clone(),
        inspected_at: record.inspected_at,
        resolution_label: record.resolution.label(),
    }
}
