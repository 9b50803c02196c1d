use super::views::{ReportSummary, TradeDefectCount};
use crate::workflows::inspection::domain::Severity;
use crate::workflows::inspection::evaluation::{
    DefectBandThresholds, SettlementVerdict, TradeStatus,
};
use serde::Serialize;

/// Settlement band by total defect count, alongside the rule-based verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectBand {
    ReadyForSettlement,
    MinorWork,
    MajorWork,
    ExtensiveWork,
}

impl DefectBand {
    pub fn classify(defects: usize, thresholds: &DefectBandThresholds) -> Self {
        if defects <= thresholds.ready_max {
            Self::ReadyForSettlement
        } else if defects <= thresholds.minor_work_max {
            Self::MinorWork
        } else if defects <= thresholds.major_work_max {
            Self::MajorWork
        } else {
            Self::ExtensiveWork
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ReadyForSettlement => "Ready for Settlement",
            Self::MinorWork => "Minor Work Required",
            Self::MajorWork => "Major Work Required",
            Self::ExtensiveWork => "Extensive Work Required",
        }
    }
}

pub(super) fn summarize(
    verdict: &SettlementVerdict,
    skipped_rows: usize,
    thresholds: &DefectBandThresholds,
) -> ReportSummary {
    let mut critical_findings = 0;
    let mut major_findings = 0;
    let mut minor_findings = 0;
    let mut resolved_records = 0;
    let mut trades_failed = 0;
    let mut trades_incomplete = 0;
    let mut trades_passed = 0;

    for trade in &verdict.trade_verdicts {
        for finding in &trade.findings {
            resolved_records += 1;
            match finding.severity {
                Severity::Critical => critical_findings += 1,
                Severity::Major => major_findings += 1,
                Severity::Minor => minor_findings += 1,
            }
        }
        match trade.status {
            TradeStatus::Fail => trades_failed += 1,
            TradeStatus::Incomplete => trades_incomplete += 1,
            TradeStatus::Pass => trades_passed += 1,
        }
    }

    let total_records = resolved_records + verdict.unresolved_records;
    let defect_band = DefectBand::classify(total_records, thresholds);

    let mut trade_defects: Vec<TradeDefectCount> = verdict
        .trade_verdicts
        .iter()
        .filter(|trade| !trade.findings.is_empty())
        .map(|trade| TradeDefectCount {
            trade: trade.trade,
            trade_label: trade.trade.label(),
            defects: trade.findings.len(),
        })
        .collect();
    trade_defects.sort_by(|a, b| b.defects.cmp(&a.defects).then_with(|| a.trade.cmp(&b.trade)));

    ReportSummary {
        total_records,
        resolved_records,
        unresolved_records: verdict.unresolved_records,
        skipped_rows,
        critical_findings,
        major_findings,
        minor_findings,
        trades_evaluated: verdict.trade_verdicts.len(),
        trades_failed,
        trades_incomplete,
        trades_passed,
        defect_band,
        defect_band_label: defect_band.label(),
        trade_defects,
        reasons: verdict.reasons.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_inclusive_upper_bounds() {
        let thresholds = DefectBandThresholds::default();
        assert_eq!(DefectBand::classify(0, &thresholds), DefectBand::ReadyForSettlement);
        assert_eq!(DefectBand::classify(2, &thresholds), DefectBand::ReadyForSettlement);
        assert_eq!(DefectBand::classify(3, &thresholds), DefectBand::MinorWork);
        assert_eq!(DefectBand::classify(7, &thresholds), DefectBand::MinorWork);
        assert_eq!(DefectBand::classify(8, &thresholds), DefectBand::MajorWork);
        assert_eq!(DefectBand::classify(15, &thresholds), DefectBand::MajorWork);
        assert_eq!(DefectBand::classify(16, &thresholds), DefectBand::ExtensiveWork);
    }
}
