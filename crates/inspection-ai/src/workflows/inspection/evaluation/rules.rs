use super::config::ReadinessPolicy;
use super::{TradeStatus, TradeVerdict};
use crate::workflows::inspection::domain::{InspectionRecord, Severity, Trade};
use std::cmp::Ordering;

/// Report order for findings: Critical before Major before Minor, then oldest
/// inspection first (undated last), then finding code and source line so equal
/// inputs always produce the same sequence.
pub(crate) fn finding_order(a: &InspectionRecord, b: &InspectionRecord) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| match (a.inspected_at, b.inspected_at) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.finding_code.cmp(&b.finding_code))
        .then_with(|| a.line.cmp(&b.line))
}

/// Verdict order: failing trades first, then incomplete, then passing; within a
/// status the trade with more Critical, then more Major findings leads.
pub(crate) fn verdict_order(a: &TradeVerdict, b: &TradeVerdict) -> Ordering {
    status_rank(a.status)
        .cmp(&status_rank(b.status))
        .then_with(|| b.count(Severity::Critical).cmp(&a.count(Severity::Critical)))
        .then_with(|| b.count(Severity::Major).cmp(&a.count(Severity::Major)))
        .then_with(|| a.trade.cmp(&b.trade))
}

fn status_rank(status: TradeStatus) -> u8 {
    match status {
        TradeStatus::Fail => 0,
        TradeStatus::Incomplete => 1,
        TradeStatus::Pass => 2,
    }
}

/// Judge one trade group. `findings` must already be sorted with [`finding_order`].
pub(crate) fn judge_trade(
    trade: Trade,
    findings: Vec<InspectionRecord>,
    expected: bool,
    policy: &ReadinessPolicy,
) -> TradeVerdict {
    if findings.is_empty() {
        let status = if expected {
            TradeStatus::Incomplete
        } else {
            TradeStatus::Pass
        };
        return TradeVerdict {
            trade,
            status,
            expected,
            blocking_findings: Vec::new(),
            findings,
        };
    }

    let critical = findings
        .iter()
        .filter(|record| record.severity == Severity::Critical)
        .count();
    let major = findings
        .iter()
        .filter(|record| record.severity == Severity::Major)
        .count();

    let status = if critical > 0 || major >= policy.major_finding_threshold() {
        TradeStatus::Fail
    } else {
        TradeStatus::Pass
    };

    let blocking_findings = if status == TradeStatus::Fail {
        findings
            .iter()
            .filter(|record| record.severity >= Severity::Major)
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    TradeVerdict {
        trade,
        status,
        expected,
        blocking_findings,
        findings,
    }
}
