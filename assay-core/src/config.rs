//! Configuration for the assessment core.
//!
//! Every section carries `#[serde(default)]`, so a TOML file only needs the
//! keys it wants to override:
//!
//! ```toml
//! [telemetry]
//! assistant_tokens = ["claude", "aider"]
//! prompt_debounce_bytes = 200
//!
//! [profile.narrative]
//! backend = "mock"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Terminal telemetry parsing.
    pub telemetry: TelemetryConfig,
    /// Code-quality heuristics.
    pub quality: QualityConfig,
    /// Adaptive tier thresholds.
    pub adaptive: AdaptiveConfig,
    /// Profile aggregation and narrative generation.
    pub profile: ProfileConfig,
}

impl AssayConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AssayError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Default config location: `<config dir>/assay/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assay/config.toml")
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}

/// Terminal telemetry parser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Commands that start an assistant session when typed at the shell.
    pub assistant_tokens: Vec<String>,
    /// Regex matched against the last line of ANSI-stripped output to detect
    /// a shell prompt.
    ///
    /// The default requires a line ending in `$` or `#`, either alone or after
    /// a word, `~`, `/`, `]` or `)` (`user@box:~$`, `[me@host src]$`,
    /// `root@box:/#`). A bare `>` or `%` is not accepted: assistant CLIs draw a
    /// `> ` input box and stream code ending in `>`.
    pub prompt_pattern: String,
    /// Output bytes that must accumulate inside a session before a prompt
    /// match is allowed to close it.
    ///
    /// Tuned against a bash-style `user@host:dir$` prompt; other prompt
    /// styles may need a different value.
    pub prompt_debounce_bytes: usize,
    /// Prompts per session that saturate the iteration score.
    pub target_prompts_per_session: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            assistant_tokens: vec!["claude".to_string()],
            prompt_pattern: r"^(?:.*[\w~/\])]\s?)?[$#]\s*$".to_string(),
            prompt_debounce_bytes: 100,
            target_prompts_per_session: 5.0,
        }
    }
}

/// Code-quality heuristic settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Regex patterns per topic tag. A topic counts as covered when any of
    /// its patterns matches the submission.
    pub topic_patterns: BTreeMap<String, Vec<String>>,
    /// Regex matching one function definition.
    pub function_pattern: String,
    /// Function count that earns full decomposition credit.
    pub min_functions: usize,
    /// Smallest line count inside the sanity band.
    pub min_lines: usize,
    /// Largest line count inside the sanity band.
    pub max_lines: usize,
    /// Shell commands that saturate the behavioral command term.
    pub shell_command_saturation: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        let topic_patterns = [
            ("recursion", vec![r"(?i)\brecurs", r"(?i)\bbase\s+case\b"]),
            (
                "hashmap",
                vec![r"\bHashMap\b", r"\bdict\s*\(", r"\bnew\s+Map\s*\(", r"\bMap<"],
            ),
            (
                "sorting",
                vec![r"\.sort(?:_by|_unstable)?\s*\(", r"\bsorted\s*\(", r"(?i)\bsort"],
            ),
            (
                "async",
                vec![r"\basync\b", r"\bawait\b", r"\bPromise\b", r"\bFuture\b"],
            ),
            (
                "error-handling",
                vec![r"\bResult<", r"\btry\s*[:{]", r"\bcatch\b", r"\bexcept\b", r"\?;"],
            ),
            (
                "iteration",
                vec![r"\bfor\b", r"\bwhile\b", r"\.iter\(\)", r"\.map\s*\(", r"\.forEach\s*\("],
            ),
            (
                "strings",
                vec![r"\bString\b", r"\.split\s*\(", r"\.join\s*\(", r"\.trim\w*\s*\("],
            ),
            (
                "testing",
                vec![r"#\[test\]", r"\bassert", r"\bdescribe\s*\(", r"\bit\s*\(", r"\bdef\s+test_"],
            ),
        ]
        .into_iter()
        .map(|(topic, patterns)| {
            (
                topic.to_string(),
                patterns.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();

        Self {
            topic_patterns,
            function_pattern: concat!(
                r"\b(?:fn|def|func|function)\s+[A-Za-z_]\w*",
                r"|\b[A-Za-z_]\w*\s*=\s*(?:async\s*)?\([^()]*\)\s*=>",
            )
            .to_string(),
            min_functions: 3,
            min_lines: 20,
            max_lines: 500,
            shell_command_saturation: 10.0,
        }
    }
}

/// Thresholds for the adaptive tier rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Fraction of the time limit under which a completion counts as fast.
    pub fast_time_fraction: f64,
    /// Quality above which a fast completion escalates.
    pub escalate_quality: f64,
    /// Quality below which the next exercise de-escalates.
    pub deescalate_quality: f64,
    /// Reliance above which a completion is held and flagged for review.
    pub high_reliance: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            fast_time_fraction: 0.6,
            escalate_quality: 0.6,
            deescalate_quality: 0.4,
            high_reliance: 0.7,
        }
    }
}

/// Profile aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Narrative generator backend.
    pub narrative: NarrativeConfig,
    /// Hard ceiling on the narrative call, including retries.
    pub narrative_timeout_seconds: u64,
    /// Lines a review comment may sit away from a planted issue and still find it.
    pub review_line_tolerance: u32,
    /// Prompt length (chars) that earns the length part of prompt quality.
    pub prompt_min_chars: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            narrative: NarrativeConfig::default(),
            narrative_timeout_seconds: 90,
            review_line_tolerance: 2,
            prompt_min_chars: 40,
        }
    }
}

/// Backend configuration for the command-based narrative generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Whether narrative generation is enabled.
    pub enabled: bool,
    /// `command` runs `program` as a subprocess, `mock` returns a canned verdict.
    pub backend: String,
    /// Program spawned by the `command` backend.
    pub program: String,
    /// Arguments passed to `program`.
    pub args: Vec<String>,
    /// Timeout per attempt in seconds.
    pub timeout_seconds: u32,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: "command".to_string(),
            program: "claude".to_string(),
            args: vec![
                "--print".to_string(),
                "--output-format".to_string(),
                "json".to_string(),
            ],
            timeout_seconds: 30,
            max_retries: 2,
        }
    }
}
