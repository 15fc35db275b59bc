//! Weighted signal combination.
//!
//! A [`Signal`] is a named value with a weight and an availability flag.
//! Two folds are provided:
//!
//! - [`weighted_sum`] adds `value × weight` for available signals, for
//!   checklists where each satisfied condition earns its weight;
//! - [`normalized_sum`] divides by the weight of the available signals, for
//!   averages that should not be dragged down by missing data.
//!
//! [`BlendPolicy`] covers the case where the weights themselves change with
//! availability: an ordered list of rules, the first one whose required
//! signals are all present wins.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named, weighted contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub value: f64,
    pub weight: f64,
    pub available: bool,
}

impl Signal {
    /// An available signal.
    pub fn new(name: impl Into<String>, value: f64, weight: f64) -> Self {
        Self {
            name: name.into(),
            value,
            weight,
            available: true,
        }
    }

    /// A signal that is available only when `value` is `Some`.
    pub fn optional(name: impl Into<String>, value: Option<f64>, weight: f64) -> Self {
        Self {
            name: name.into(),
            value: value.unwrap_or(0.0),
            weight,
            available: value.is_some(),
        }
    }

    /// Restrict availability to when `condition` holds.
    #[must_use]
    pub fn when(mut self, condition: bool) -> Self {
        self.available &= condition;
        self
    }

    fn contribution(&self) -> f64 {
        self.value * self.weight
    }
}

/// Sum of `value × weight` over available signals.
pub fn weighted_sum(signals: &[Signal]) -> f64 {
    signals
        .iter()
        .filter(|s| s.available)
        .map(Signal::contribution)
        .sum()
}

/// Weighted mean over available signals, `None` when nothing is available.
pub fn normalized_sum(signals: &[Signal]) -> Option<f64> {
    let total_weight: f64 = signals
        .iter()
        .filter(|s| s.available)
        .map(|s| s.weight)
        .sum();

    if total_weight <= 0.0 {
        return None;
    }
    Some(weighted_sum(signals) / total_weight)
}

/// One row of a blend policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendRule {
    /// Signals that must all be present for this rule to apply.
    pub requires: Vec<String>,
    /// Weights applied when the rule applies.
    pub weights: Vec<(String, f64)>,
}

impl BlendRule {
    fn applies(&self, present: &HashMap<&str, f64>) -> bool {
        self.requires.iter().all(|r| present.contains_key(r.as_str()))
    }
}

/// Ordered blend rules; the first applicable rule decides the weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendPolicy {
    rules: Vec<BlendRule>,
}

impl BlendPolicy {
    /// An empty policy. Blending with no rules yields `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    #[must_use]
    pub fn rule(mut self, requires: &[&str], weights: &[(&str, f64)]) -> Self {
        self.rules.push(BlendRule {
            requires: requires.iter().map(|r| r.to_string()).collect(),
            weights: weights.iter().map(|(n, w)| (n.to_string(), *w)).collect(),
        });
        self
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[BlendRule] {
        &self.rules
    }

    /// The rule that applies to this availability pattern.
    pub fn select(&self, signals: &[Signal]) -> Option<&BlendRule> {
        let present = present_values(signals);
        self.rules.iter().find(|rule| rule.applies(&present))
    }

    /// Blend signals under the first applicable rule, clamped to `[0, 1]`.
    ///
    /// Returns `None` when no rule applies.
    pub fn blend(&self, signals: &[Signal]) -> Option<f64> {
        let present = present_values(signals);
        let rule = self.rules.iter().find(|rule| rule.applies(&present))?;

        let weighted: Vec<Signal> = rule
            .weights
            .iter()
            .map(|(name, weight)| {
                Signal::optional(name.clone(), present.get(name.as_str()).copied(), *weight)
            })
            .collect();

        normalized_sum(&weighted).map(|v| v.clamp(0.0, 1.0))
    }
}

fn present_values(signals: &[Signal]) -> HashMap<&str, f64> {
    signals
        .iter()
        .filter(|s| s.available)
        .map(|s| (s.name.as_str(), s.value))
        .collect()
}
