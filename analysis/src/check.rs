
use crate::nested::Nested;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// What to verify on a single series
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckAction {
    /// never report anything
    Ignore,
    /// report when the latest performance dropped by more than `threshold`
    /// (a fraction, 0.15 is 15%) compared to the previous invocation
    Decrease { threshold: f64 },
}

impl Default for CheckAction {
    fn default() -> Self {
        Self::Decrease { threshold: 0.15 }
    }
}

/// Rule keyed by the nested path, `None` matches anything at that level
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CheckRule {
    #[serde(default)]
    pub benchmark: Option<String>,
    #[serde(default)]
    pub dpus: Option<u32>,
    #[serde(default)]
    pub tasklets: Option<u32>,
    /// measure label, i.e. without the ` Time (ms)` suffix
    #[serde(default)]
    pub measure: Option<String>,
    pub action: CheckAction,
}

/// the rules applied when nothing is configured
pub fn default_rules() -> Vec<CheckRule> {
    vec![CheckRule {
        benchmark: Some("SEL".to_string()),
        dpus: None,
        tasklets: None,
        measure: Some("Inter-DPU".to_string()),
        action: CheckAction::Ignore,
    }]
}

/// a single failed check, as written to the report
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Finding {
    pub previous: f64,
    /// `None` when the measurement vanished from the latest invocation
    pub latest: Option<f64>,
    /// latest performance relative to the previous one, 0 when vanished
    pub ratio: f64,
    pub message: String,
    pub series: Vec<Option<f64>>,
}

/// encoded identifier -> finding
pub type Report = BTreeMap<String, Finding>;

/// path of a series, compared level by level against the rules
enum Level<'a> {
    Text(&'a str),
    Count(u32),
}

fn level_of<'r>(rule: &'r CheckRule, depth: usize) -> Option<Level<'r>> {
    match depth {
        0 => rule.benchmark.as_deref().map(Level::Text),
        1 => rule.dpus.map(Level::Count),
        2 => rule.tasklets.map(Level::Count),
        _ => rule.measure.as_deref().map(Level::Text),
    }
}

fn matches(rule_level: &Level<'_>, key: &Level<'_>) -> bool {
    match (rule_level, key) {
        (Level::Text(rule), Level::Text(key)) => rule == key,
        (Level::Count(rule), Level::Count(key)) => rule == key,
        _ => false,
    }
}

#[derive(Clone, Debug, Default)]
pub struct Checker {
    rules: Vec<CheckRule>,
    default: CheckAction,
}

impl Checker {
    pub fn new(rules: Vec<CheckRule>, default: CheckAction) -> Self {
        Self { rules, default }
    }

    /// Pick the action for a series
    ///
    /// Levels are walked in order benchmark, dpus, tasklets, measure. At each level
    /// the rules matching exactly are kept if there are any, otherwise the ones
    /// with a wildcard. When no rule survives the default applies, among several
    /// survivors the first declared one wins.
    pub fn select(&self, benchmark: &str, dpus: u32, tasklets: u32, measure: &str) -> &CheckAction {
        let keys = [
            Level::Text(benchmark),
            Level::Count(dpus),
            Level::Count(tasklets),
            Level::Text(measure),
        ];

        let mut candidates: Vec<&CheckRule> = self.rules.iter().collect();

        for (depth, key) in keys.iter().enumerate() {
            let exact: Vec<&CheckRule> = candidates
                .iter()
                .copied()
                .filter(|rule| level_of(rule, depth).map_or(false, |level| matches(&level, key)))
                .collect();

            candidates = if exact.is_empty() {
                candidates
                    .into_iter()
                    .filter(|rule| level_of(rule, depth).is_none())
                    .collect()
            } else {
                exact
            };

            if candidates.is_empty() {
                return &self.default;
            }
        }

        &candidates[0].action
    }

    /// Run every series of `nested` through its selected action
    #[tracing::instrument(level = "info", skip_all)]
    pub fn check(&self, nested: &Nested) -> Report {
        let mut report = Report::new();

        for (benchmark, dpus, tasklets, label, series) in nested.series() {
            let action = self.select(benchmark, dpus, tasklets, label);
            debug!(identifier = %series.identifier, action = ?action, "Checking series");

            if let Some(finding) = action.evaluate(&series.history) {
                report.insert(series.identifier.encode(), finding);
            }
        }

        info!(findings = report.len(), "Checked all series");

        report
    }
}

impl CheckAction {
    /// `None` when the series is fine
    pub fn evaluate(&self, history: &[f64]) -> Option<Finding> {
        match self {
            Self::Ignore => None,
            Self::Decrease { threshold } => {
                let [.., previous, latest] = history else {
                    return None;
                };

                // nothing to compare against
                if !(*previous > 0.0) {
                    return None;
                }

                let series = history
                    .iter()
                    .map(|value| (!value.is_nan()).then_some(*value))
                    .collect();

                // a measurement that disappeared lost all of its performance
                if latest.is_nan() {
                    return Some(Finding {
                        previous: *previous,
                        latest: None,
                        ratio: 0.0,
                        message: "measurement missing from the latest invocation".to_string(),
                        series,
                    });
                }

                if !(*latest > 0.0) {
                    return None;
                }

                // performance is the inverse of time
                let ratio = previous / latest;

                (ratio < 1.0 - threshold).then(|| Finding {
                    previous: *previous,
                    latest: Some(*latest),
                    ratio,
                    message: format!(
                        "perf decrease above threshold: {:.2}% of previous performance",
                        ratio * 100.0
                    ),
                    series,
                })
            }
        }
    }
}
