use super::{OverallStatus, TradeStatus, TradeVerdict};
use crate::workflows::inspection::domain::Severity;
use serde::Serialize;

/// Missing policy configuration that makes a property impossible to judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationError {
    #[error("no expected-trade list is configured for jurisdiction {jurisdiction}")]
    MissingTradeExpectations { jurisdiction: String },
}

pub(crate) fn overall_status(
    verdicts: &[TradeVerdict],
    configuration_issue: Option<&ConfigurationError>,
) -> OverallStatus {
    if configuration_issue.is_some() {
        return OverallStatus::Incomplete;
    }
    if verdicts.iter().any(|verdict| verdict.status == TradeStatus::Fail) {
        return OverallStatus::NotReady;
    }
    if verdicts
        .iter()
        .any(|verdict| verdict.status == TradeStatus::Incomplete)
    {
        return OverallStatus::Incomplete;
    }
    OverallStatus::Ready
}

/// Human-readable justification lines, in verdict order.
pub(crate) fn verdict_reasons(
    verdicts: &[TradeVerdict],
    major_threshold: usize,
    unresolved_records: usize,
    configuration_issue: Option<&ConfigurationError>,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(issue) = configuration_issue {
        reasons.push(format!("evaluation incomplete: {issue}"));
    }

    for verdict in verdicts {
        match verdict.status {
            TradeStatus::Fail => {
                let critical = verdict.count(Severity::Critical);
                let major = verdict.count(Severity::Major);
                if critical > 0 {
                    reasons.push(format!(
                        "{} failed: {critical} critical finding(s)",
                        verdict.trade.label()
                    ));
                } else {
                    reasons.push(format!(
                        "{} failed: {major} major finding(s) (threshold {major_threshold})",
                        verdict.trade.label()
                    ));
                }
            }
            TradeStatus::Incomplete => reasons.push(format!(
                "{} incomplete: expected trade has no inspection records",
                verdict.trade.label()
            )),
            TradeStatus::Pass => {}
        }
    }

    if unresolved_records > 0 {
        reasons.push(format!(
            "{unresolved_records} record(s) have unmapped trade labels and were not evaluated"
        ));
    }

    reasons
}
