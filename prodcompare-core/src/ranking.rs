//! Rank engine: classifies each product's value for one attribute.
//!
//! Ranking is all-or-nothing per row: either every value yields a number and
//! the extremes are marked, or the whole row stays neutral.

use crate::config::RulesConfig;
use crate::normalizer::SpecNormalizer;
use crate::types::Classification;

/// Whether larger or smaller values win for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directionality {
    HigherIsBetter,
    LowerIsBetter,
}

/// Per-attribute best/worst classifier.
#[derive(Debug, Clone)]
pub struct RankEngine {
    normalizer: SpecNormalizer,
    higher_is_better: Vec<String>,
    lower_is_better: Vec<String>,
}

impl RankEngine {
    pub fn new(rules: &RulesConfig) -> Self {
        let lower = |list: &[String]| -> Vec<String> {
            list.iter().map(|l| l.to_lowercase()).collect()
        };
        Self {
            normalizer: SpecNormalizer::new(rules),
            higher_is_better: lower(rules.higher_is_better.as_slice()),
            lower_is_better: lower(rules.lower_is_better.as_slice()),
        }
    }

    pub fn normalizer(&self) -> &SpecNormalizer {
        &self.normalizer
    }

    /// Directionality of `label`; higher-is-better is checked first.
    pub fn directionality(&self, label: &str) -> Option<Directionality> {
        let label = label.to_lowercase();
        let matches = |list: &[String]| list.iter().any(|entry| label.contains(entry.as_str()));
        if matches(self.higher_is_better.as_slice()) {
            Some(Directionality::HigherIsBetter)
        } else if matches(self.lower_is_better.as_slice()) {
            Some(Directionality::LowerIsBetter)
        } else {
            None
        }
    }

    /// Classify every value of one attribute, index-aligned with `values`.
    pub fn classify<S: AsRef<str>>(&self, label: &str, values: &[S]) -> Vec<Classification> {
        let neutral = || vec![Classification::Neutral; values.len()];

        if values.len() < 2 {
            return neutral();
        }
        let Some(direction) = self.directionality(label) else {
            return neutral();
        };

        let numbers: Option<Vec<f64>> = values
            .iter()
            .map(|v| self.normalizer.extract(label, v.as_ref()))
            .collect();
        let Some(numbers) = numbers else {
            tracing::debug!(label, "row left neutral: not every value is extractable");
            return neutral();
        };

        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let (best, worst) = match direction {
            Directionality::HigherIsBetter => (max, min),
            Directionality::LowerIsBetter => (min, max),
        };
        if best == worst {
            return neutral();
        }

        numbers
            .into_iter()
            .map(|n| {
                if n == best {
                    Classification::Best
                } else if n == worst {
                    Classification::Worst
                } else {
                    Classification::Neutral
                }
            })
            .collect()
    }
}

impl Default for RankEngine {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

/// Stock rule: only a mixed set of statuses is ranked, in-stock first.
pub fn classify_stock(statuses: &[bool]) -> Vec<Classification> {
    let any_in = statuses.iter().any(|s| *s);
    let any_out = statuses.iter().any(|s| !*s);
    if !(any_in && any_out) {
        return vec![Classification::Neutral; statuses.len()];
    }
    statuses
        .iter()
        .map(|in_stock| {
            if *in_stock {
                Classification::Best
            } else {
                Classification::Worst
            }
        })
        .collect()
}
