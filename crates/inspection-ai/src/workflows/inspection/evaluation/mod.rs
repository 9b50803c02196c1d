mod config;
mod policy;
mod rules;

pub use config::{DefectBandThresholds, ReadinessPolicy};
pub use policy::ConfigurationError;

use super::domain::{InspectionRecord, PropertyId, Severity, Trade};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Pass,
    Fail,
    Incomplete,
}

impl TradeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::Incomplete => "Incomplete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Ready,
    NotReady,
    Incomplete,
}

impl OverallStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready for Settlement",
            Self::NotReady => "Not Ready",
            Self::Incomplete => "Incomplete",
        }
    }
}

/// Outcome for one trade of one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeVerdict {
    pub trade: Trade,
    pub status: TradeStatus,
    pub expected: bool,
    /// Critical and Major findings behind a Fail, in report order.
    pub blocking_findings: Vec<InspectionRecord>,
    /// Every resolved finding for the trade, in report order.
    pub findings: Vec<InspectionRecord>,
}

impl TradeVerdict {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|record| record.severity == severity)
            .count()
    }
}

/// Root aggregate of one evaluation run for one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementVerdict {
    pub property_id: PropertyId,
    pub jurisdiction: Option<String>,
    pub overall_status: OverallStatus,
    pub trade_verdicts: Vec<TradeVerdict>,
    pub generated_at: NaiveDateTime,
    /// Set when records with unmapped trade labels were left out of the decision.
    pub mapping_warning: bool,
    pub unresolved_records: usize,
    pub configuration_issue: Option<ConfigurationError>,
    pub reasons: Vec<String>,
}

impl SettlementVerdict {
    pub fn trade(&self, trade: Trade) -> Option<&TradeVerdict> {
        self.trade_verdicts
            .iter()
            .find(|verdict| verdict.trade == trade)
    }

    pub fn incomplete_trades(&self) -> impl Iterator<Item = &TradeVerdict> {
        self.trade_verdicts
            .iter()
            .filter(|verdict| verdict.status == TradeStatus::Incomplete)
    }
}

/// Inputs that identify the property being judged. `evaluated_at` is supplied by the
/// caller so evaluation stays replayable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyContext {
    pub property_id: PropertyId,
    pub jurisdiction: Option<String>,
    pub evaluated_at: NaiveDateTime,
}

impl PropertyContext {
    /// Take the first jurisdiction named by the property's records, in row order.
    pub fn from_records(
        property_id: PropertyId,
        records: &[InspectionRecord],
        evaluated_at: NaiveDateTime,
    ) -> Self {
        let jurisdiction = records
            .iter()
            .filter(|record| record.property_id == property_id)
            .find_map(|record| record.jurisdiction.clone());
        Self {
            property_id,
            jurisdiction,
            evaluated_at,
        }
    }
}

/// Stateless evaluator applying a [`ReadinessPolicy`] to one property's records.
#[derive(Debug, Clone)]
pub struct ReadinessEvaluator {
    policy: ReadinessPolicy,
}

impl ReadinessEvaluator {
    pub fn new(policy: ReadinessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ReadinessPolicy {
        &self.policy
    }

    pub fn evaluate(
        &self,
        context: &PropertyContext,
        records: &[InspectionRecord],
    ) -> SettlementVerdict {
        let jurisdiction = self
            .policy
            .resolve_jurisdiction(context.jurisdiction.as_deref());

        let (expected, configuration_issue) =
            match self.policy.expected_trades_for(jurisdiction.as_deref()) {
                Ok(trades) => (trades.clone(), None),
                Err(issue) => {
                    warn!(property_id = %context.property_id, %issue, "trade expectations missing");
                    (Default::default(), Some(issue))
                }
            };

        let mut groups: BTreeMap<Trade, Vec<InspectionRecord>> = expected
            .iter()
            .map(|trade| (*trade, Vec::new()))
            .collect();
        let mut unresolved_records = 0;

        for record in records {
            if record.property_id != context.property_id {
                warn!(
                    property_id = %context.property_id,
                    other = %record.property_id,
                    line = record.line,
                    "record for another property ignored"
                );
                continue;
            }
            match record.canonical_trade {
                Some(trade) if record.is_resolved() => {
                    groups.entry(trade).or_default().push(record.clone())
                }
                _ => unresolved_records += 1,
            }
        }

        let mut trade_verdicts: Vec<TradeVerdict> = groups
            .into_iter()
            .map(|(trade, mut findings)| {
                findings.sort_by(rules::finding_order);
                rules::judge_trade(trade, findings, expected.contains(&trade), &self.policy)
            })
            .collect();
        trade_verdicts.sort_by(rules::verdict_order);

        let overall_status = policy::overall_status(&trade_verdicts, configuration_issue.as_ref());
        let reasons = policy::verdict_reasons(
            &trade_verdicts,
            self.policy.major_finding_threshold(),
            unresolved_records,
            configuration_issue.as_ref(),
        );

        debug!(
            property_id = %context.property_id,
            status = overall_status.label(),
            trades = trade_verdicts.len(),
            unresolved_records,
            "settlement verdict computed"
        );

        SettlementVerdict {
            property_id: context.property_id.clone(),
            jurisdiction,
            overall_status,
            trade_verdicts,
            generated_at: context.evaluated_at,
            mapping_warning: unresolved_records > 0,
            unresolved_records,
            configuration_issue,
            reasons,
        }
    }
}
