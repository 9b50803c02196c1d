use super::domain::InspectionRecord;
use super::mapping::UnmappedLabel;
use super::normalizer::normalize_label;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmappedTerm {
    /// Spelling of the label as first seen in the export.
    pub raw_label: String,
    pub occurrences: usize,
}

/// Raw trade labels that failed lookup during a run, with occurrence counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmappedTermReport {
    terms: BTreeMap<String, UnmappedTerm>,
}

impl UnmappedTermReport {
    /// Rebuild the report from records that did not resolve, e.g. for a single property.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a InspectionRecord>,
    {
        let mut report = Self::default();
        for record in records.into_iter().filter(|record| !record.is_resolved()) {
            report.add(&normalize_label(&record.raw_trade_label), &record.raw_trade_label, 1);
        }
        report
    }

    pub fn record(&mut self, label: &UnmappedLabel) {
        self.add(&label.normalized, &label.raw_label, 1);
    }

    pub fn merge(&mut self, other: &UnmappedTermReport) {
        for (key, term) in &other.terms {
            self.add(key, &term.raw_label, term.occurrences);
        }
    }

    pub fn occurrences(&self, raw_label: &str) -> usize {
        self.terms
            .get(&normalize_label(raw_label))
            .map(|term| term.occurrences)
            .unwrap_or(0)
    }

    /// Terms ordered by occurrences (most frequent first), then label.
    pub fn terms(&self) -> Vec<UnmappedTerm> {
        let mut terms: Vec<_> = self.terms.values().cloned().collect();
        terms.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| a.raw_label.cmp(&b.raw_label))
        });
        terms
    }

    pub fn total_occurrences(&self) -> usize {
        self.terms.values().map(|term| term.occurrences).sum()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn add(&mut self, key: &str, raw_label: &str, count: usize) {
        self.terms
            .entry(key.to_string())
            .or_insert_with(|| UnmappedTerm {
                raw_label: raw_label.trim().to_string(),
                occurrences: 0,
            })
            .occurrences += count;
    }
}
