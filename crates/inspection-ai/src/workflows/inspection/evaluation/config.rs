use super::policy::ConfigurationError;
use crate::workflows::inspection::domain::Trade;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tunable readiness policy. Thresholds are stakeholder decisions, not constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPolicy {
    /// Number of Major findings in one trade that fails the trade; read through
    /// [`ReadinessPolicy::major_finding_threshold`].
    major_finding_threshold: usize,
    /// Trades that must be inspected, keyed by upper-cased jurisdiction code.
    pub expected_trades: BTreeMap<String, BTreeSet<Trade>>,
    /// Used when neither the caller nor the records name a jurisdiction.
    pub default_jurisdiction: Option<String>,
    /// Trades expected when no jurisdiction is known at all.
    pub baseline_trades: BTreeSet<Trade>,
    pub defect_bands: DefectBandThresholds,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            major_finding_threshold: 2,
            expected_trades: BTreeMap::new(),
            default_jurisdiction: None,
            baseline_trades: BTreeSet::new(),
            defect_bands: DefectBandThresholds::default(),
        }
    }
}

impl ReadinessPolicy {
    pub fn with_expectation<I>(mut self, jurisdiction: &str, trades: I) -> Self
    where
        I: IntoIterator<Item = Trade>,
    {
        self.expected_trades
            .insert(jurisdiction_key(jurisdiction), trades.into_iter().collect());
        self
    }

    pub fn with_default_jurisdiction(mut self, jurisdiction: &str) -> Self {
        self.default_jurisdiction = Some(jurisdiction_key(jurisdiction));
        self
    }

    pub fn with_major_finding_threshold(mut self, threshold: usize) -> Self {
        self.major_finding_threshold = threshold.max(1);
        self
    }

    /// Never below one, even for a policy deserialized with a zero.
    pub fn major_finding_threshold(&self) -> usize {
        self.major_finding_threshold.max(1)
    }

    /// The jurisdiction that applies to a property, falling back to the default.
    pub fn resolve_jurisdiction(&self, jurisdiction: Option<&str>) -> Option<String> {
        jurisdiction
            .map(jurisdiction_key)
            .filter(|key| !key.is_empty())
            .or_else(|| self.default_jurisdiction.clone())
    }

    pub fn expected_trades_for(
        &self,
        jurisdiction: Option<&str>,
    ) -> Result<&BTreeSet<Trade>, ConfigurationError> {
        match jurisdiction {
            None => Ok(&self.baseline_trades),
            Some(code) => self.expected_trades.get(&jurisdiction_key(code)).ok_or_else(|| {
                ConfigurationError::MissingTradeExpectations {
                    jurisdiction: jurisdiction_key(code),
                }
            }),
        }
    }
}

/// Upper bounds (inclusive) on total defects for each settlement band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectBandThresholds {
    pub ready_max: usize,
    pub minor_work_max: usize,
    pub major_work_max: usize,
}

impl Default for DefectBandThresholds {
    fn default() -> Self {
        Self {
            ready_max: 2,
            minor_work_max: 7,
            major_work_max: 15,
        }
    }
}

pub(crate) fn jurisdiction_key(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}
