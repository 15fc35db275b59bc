//! Code-quality scoring.
//!
//! Three sub-scores feed the blend:
//!
//! | signal | source | always present |
//! |---|---|---|
//! | `tests` | pass ratio of the test run | no |
//! | `heuristic` | topic coverage, decomposition, size band, bracket balance | yes |
//! | `behavior` | iteration, manual activity, shell usage from telemetry | no |

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::QualityConfig;
use crate::error::{AssayError, Result};
use crate::telemetry::BehavioralMetrics;

use super::signal::{BlendPolicy, Signal, weighted_sum};

const TESTS: &str = "tests";
const HEURISTIC: &str = "heuristic";
const BEHAVIOR: &str = "behavior";

/// Outcome of running the exercise's test suite against a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunResult {
    pub passed: u32,
    pub failed: u32,
    pub total: u32,
}

impl TestRunResult {
    /// Result with `total` derived from the two counts, saturating at `u32::MAX`.
    pub fn new(passed: u32, failed: u32) -> Self {
        Self {
            passed,
            failed,
            total: passed.saturating_add(failed),
        }
    }

    /// Fraction of tests passed, `None` when no tests ran.
    pub fn pass_ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some((f64::from(self.passed) / f64::from(self.total)).clamp(0.0, 1.0))
        }
    }
}

/// Sub-scores behind a quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub heuristic: f64,
    pub tests: Option<f64>,
    pub behavior: Option<f64>,
    pub score: f64,
}

/// Scores a submission against an exercise's expected topics.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    topic_patterns: BTreeMap<String, Vec<Regex>>,
    function_pattern: Regex,
    min_functions: usize,
    min_lines: usize,
    max_lines: usize,
    shell_command_saturation: f64,
    policy: BlendPolicy,
}

static DEFAULT_SCORER: LazyLock<QualityScorer> = LazyLock::new(|| {
    QualityScorer::new(&QualityConfig::default()).expect("default quality patterns compile")
});

impl QualityScorer {
    /// Compile the configured patterns.
    pub fn new(config: &QualityConfig) -> Result<Self> {
        let mut topic_patterns = BTreeMap::new();
        for (topic, patterns) in &config.topic_patterns {
            let compiled = patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>>>()?;
            topic_patterns.insert(topic.to_lowercase(), compiled);
        }

        Ok(Self {
            topic_patterns,
            function_pattern: compile(&config.function_pattern)?,
            min_functions: config.min_functions.max(1),
            min_lines: config.min_lines,
            max_lines: config.max_lines,
            shell_command_saturation: config.shell_command_saturation,
            policy: Self::default_policy(),
        })
    }

    /// How the three sub-scores combine depending on which are present.
    pub fn default_policy() -> BlendPolicy {
        BlendPolicy::new()
            .rule(
                &[TESTS, BEHAVIOR],
                &[(TESTS, 0.5), (HEURISTIC, 0.3), (BEHAVIOR, 0.2)],
            )
            .rule(&[TESTS], &[(TESTS, 0.6), (HEURISTIC, 0.4)])
            .rule(&[BEHAVIOR], &[(HEURISTIC, 0.7), (BEHAVIOR, 0.3)])
            .rule(&[], &[(HEURISTIC, 1.0)])
    }

    /// Quality score in `[0, 1]`.
    pub fn score(
        &self,
        code: &str,
        topics: &[String],
        tests: Option<&TestRunResult>,
        metrics: Option<&BehavioralMetrics>,
    ) -> f64 {
        self.breakdown(code, topics, tests, metrics).score
    }

    /// Quality score with its sub-scores.
    pub fn breakdown(
        &self,
        code: &str,
        topics: &[String],
        tests: Option<&TestRunResult>,
        metrics: Option<&BehavioralMetrics>,
    ) -> QualityBreakdown {
        if code.trim().is_empty() {
            return QualityBreakdown {
                heuristic: 0.0,
                tests: None,
                behavior: None,
                score: 0.0,
            };
        }

        let heuristic = self.heuristic_score(code, topics);
        let tests = tests.and_then(TestRunResult::pass_ratio);
        let behavior = metrics.map(|m| self.behavioral_score(m));

        let signals = [
            Signal::new(HEURISTIC, heuristic, 1.0),
            Signal::optional(TESTS, tests, 1.0),
            Signal::optional(BEHAVIOR, behavior, 1.0),
        ];
        let score = self.policy.blend(&signals).unwrap_or(heuristic);

        debug!(heuristic, ?tests, ?behavior, score, "quality blend");

        QualityBreakdown {
            heuristic,
            tests,
            behavior,
            score,
        }
    }

    /// Static-analysis sub-score; each satisfied heuristic earns its weight.
    pub fn heuristic_score(&self, code: &str, topics: &[String]) -> f64 {
        let coverage = self.topic_coverage(code, topics);
        let functions = self.function_pattern.find_iter(code).count();
        let lines = code.lines().filter(|l| !l.trim().is_empty()).count();
        let decomposition = if functions >= self.min_functions {
            1.0
        } else {
            0.5
        };

        let signals = [
            Signal::new("topic_coverage", coverage, 0.3),
            Signal::new("decomposition", decomposition, 0.2).when(functions > 0),
            Signal::new("line_band", 1.0, 0.2)
                .when((self.min_lines..=self.max_lines).contains(&lines)),
            Signal::new("balance", 1.0, 0.3).when(brackets_balanced(code)),
        ];

        weighted_sum(&signals).clamp(0.0, 1.0)
    }

    /// Telemetry sub-score.
    pub fn behavioral_score(&self, metrics: &BehavioralMetrics) -> f64 {
        let commands = if self.shell_command_saturation > 0.0 {
            (f64::from(metrics.shell_command_count) / self.shell_command_saturation).min(1.0)
        } else {
            1.0
        };

        let signals = [
            Signal::new("iteration", metrics.iteration_score, 0.4),
            Signal::new("manual_activity", metrics.manual_activity_ratio, 0.3),
            Signal::new("shell_commands", commands, 0.3),
        ];
        weighted_sum(&signals).clamp(0.0, 1.0)
    }

    /// Fraction of expected topics whose patterns match. No topics means
    /// nothing was missed.
    pub fn topic_coverage(&self, code: &str, topics: &[String]) -> f64 {
        if topics.is_empty() {
            return 1.0;
        }

        let matched = topics
            .iter()
            .filter(|topic| self.topic_matches(code, topic))
            .count();
        matched as f64 / topics.len() as f64
    }

    fn topic_matches(&self, code: &str, topic: &str) -> bool {
        let key = topic.trim().to_lowercase();
        match self.topic_patterns.get(&key) {
            Some(patterns) => patterns.iter().any(|p| p.is_match(code)),
            None => Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(&key)))
                .map(|re| re.is_match(code))
                .unwrap_or(false),
        }
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        DEFAULT_SCORER.clone()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| AssayError::Config(format!("invalid quality pattern {pattern:?}: {e}")))
}

/// `{}`, `()` and `[]` each close as often as they open and never go negative.
fn brackets_balanced(code: &str) -> bool {
    let mut depth = [0i64; 3];
    for ch in code.chars() {
        let (slot, delta) = match ch {
            '{' => (0, 1),
            '}' => (0, -1),
            '(' => (1, 1),
            ')' => (1, -1),
            '[' => (2, 1),
            ']' => (2, -1),
            _ => continue,
        };
        depth[slot] += delta;
        if depth[slot] < 0 {
            return false;
        }
    }
    depth.iter().all(|d| *d == 0)
}

/// Score with the default configuration.
pub fn score_quality(
    code: &str,
    topics: &[String],
    tests: Option<&TestRunResult>,
    metrics: Option<&BehavioralMetrics>,
) -> f64 {
    DEFAULT_SCORER.score(code, topics, tests, metrics)
}
