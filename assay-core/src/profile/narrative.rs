//! Narrative generation for candidate profiles.
//!
//! The narrative is written by an external text generator behind the
//! [`NarrativeGenerator`] trait. [`CommandNarrativeGenerator`] runs it as a
//! subprocess so slow generations never block the runtime:
//!
//! ```text
//! CommandNarrativeGenerator::generate(payload)
//!     │
//!     ├─ Disabled? → Err(Disabled)
//!     │
//!     ├─ Spawn backend, payload JSON on stdin
//!     │
//!     ├─ Wait with per-attempt timeout, retry up to max_retries
//!     │
//!     └─ Parse JSON verdict from stdout
//! ```

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::NarrativeConfig;
use crate::types::CandidateId;

use super::types::{PhaseScore, Recommendation};

/// Structured input handed to the narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativePayload {
    pub candidate_id: CandidateId,
    pub technical: PhaseScore,
    pub collaboration: PhaseScore,
    pub communication: PhaseScore,
    pub overall: f64,
    pub exercises_attempted: usize,
    pub exercises_completed: usize,
    /// Review comment bodies, in submission order.
    pub review_comments: Vec<String>,
}

/// What the narrative generator returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeVerdict {
    pub narrative: String,
    /// Generator's own recommendation; the score-derived one is used when absent.
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// Error type for narrative generation.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// Narrative generation is disabled in configuration.
    #[error("narrative generation is disabled")]
    Disabled,
    /// The configured backend is not known.
    #[error("unknown narrative backend: {0}")]
    UnknownBackend(String),
    /// Subprocess failed to start.
    #[error("failed to spawn subprocess: {0}")]
    SpawnFailed(std::io::Error),
    /// Generation timed out.
    #[error("narrative generation timed out after {0} seconds")]
    Timeout(u64),
    /// Subprocess exited with error.
    #[error("subprocess exited with code {0}: {1}")]
    SubprocessFailed(i32, String),
    /// Output was not a verdict.
    #[error("failed to parse response: {0}")]
    ParseFailed(String),
    /// Payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Writes the free-text part of a profile.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(
        &self,
        payload: &NarrativePayload,
    ) -> Result<NarrativeVerdict, NarrativeError>;
}

/// Generator that is always disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNarrativeGenerator;

#[async_trait]
impl NarrativeGenerator for NoOpNarrativeGenerator {
    async fn generate(
        &self,
        _payload: &NarrativePayload,
    ) -> Result<NarrativeVerdict, NarrativeError> {
        Err(NarrativeError::Disabled)
    }
}

const MOCK_VERDICT: &str =
    r#"{"narrative":"Mock narrative","recommendation":null,"strengths":[],"concerns":[]}"#;

/// Wrapper some generators put around their answer.
#[derive(Deserialize)]
struct ResultEnvelope {
    result: String,
}

/// Parse a verdict, accepting either the verdict itself or a
/// `{"result": "<verdict json>"}` envelope.
fn parse_verdict(stdout: &str) -> Result<NarrativeVerdict, NarrativeError> {
    let trimmed = stdout.trim();
    if let Ok(verdict) = serde_json::from_str::<NarrativeVerdict>(trimmed) {
        return Ok(verdict);
    }
    let envelope: ResultEnvelope = serde_json::from_str(trimmed)
        .map_err(|e| NarrativeError::ParseFailed(format!("{e}: {trimmed}")))?;
    serde_json::from_str(envelope.result.trim())
        .map_err(|e| NarrativeError::ParseFailed(format!("{e}: {}", envelope.result)))
}

/// Subprocess-backed narrative generator.
pub struct CommandNarrativeGenerator {
    config: NarrativeConfig,
}

impl CommandNarrativeGenerator {
    pub fn new(config: NarrativeConfig) -> Self {
        Self { config }
    }

    /// Whether `generate` will run the subprocess at all.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Timeout for a single attempt.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds.into())
    }

    fn command(&self) -> Result<Command, NarrativeError> {
        match self.config.backend.as_str() {
            "command" => {
                let mut cmd = Command::new(&self.config.program);
                cmd.args(&self.config.args);
                Ok(cmd)
            }
            "mock" => {
                let mut cmd = Command::new("echo");
                cmd.arg(MOCK_VERDICT);
                Ok(cmd)
            }
            other => Err(NarrativeError::UnknownBackend(other.to_string())),
        }
    }

    async fn run_subprocess(&self, input_json: &str) -> Result<NarrativeVerdict, NarrativeError> {
        let mut cmd = self.command()?;
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(NarrativeError::SpawnFailed)?;

        // Dropping stdin closes it so the child sees EOF.
        if self.config.backend == "command"
            && let Some(mut stdin) = child.stdin.take()
        {
            if let Err(e) = stdin.write_all(input_json.as_bytes()).await {
                debug!(error = %e, "narrative subprocess closed stdin early");
            }
            if let Err(e) = stdin.flush().await {
                debug!(error = %e, "failed to flush narrative subprocess stdin");
            }
        }

        let output = tokio::time::timeout(self.timeout(), child.wait_with_output())
            .await
            .map_err(|_| NarrativeError::Timeout(self.config.timeout_seconds.into()))?
            .map_err(NarrativeError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NarrativeError::SubprocessFailed(
                output.status.code().unwrap_or(-1),
                stderr.to_string(),
            ));
        }

        parse_verdict(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl NarrativeGenerator for CommandNarrativeGenerator {
    async fn generate(
        &self,
        payload: &NarrativePayload,
    ) -> Result<NarrativeVerdict, NarrativeError> {
        if !self.config.enabled {
            return Err(NarrativeError::Disabled);
        }

        let input_json = serde_json::to_string(payload)
            .map_err(|e| NarrativeError::Serialization(e.to_string()))?;

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            match self.run_subprocess(&input_json).await {
                Ok(verdict) => return Ok(verdict),
                Err(e @ NarrativeError::UnknownBackend(_)) => return Err(e),
                Err(e) => {
                    warn!(
                        candidate_id = %payload.candidate_id,
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "narrative attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(NarrativeError::Disabled))
    }
}

impl Default for CommandNarrativeGenerator {
    fn default() -> Self {
        Self::new(NarrativeConfig::default())
    }
}

impl std::fmt::Debug for CommandNarrativeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNarrativeGenerator")
            .field("enabled", &self.config.enabled)
            .field("backend", &self.config.backend)
            .field("program", &self.config.program)
            .field("timeout_seconds", &self.config.timeout_seconds)
            .finish()
    }
}
