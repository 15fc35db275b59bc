//! Loading configuration from disk and running components with it.

use std::io::Write;

use assay_core::{AssayConfig, AssayError, QualityScorer, TelemetryEvent, TelemetryParser};
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_reads_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[telemetry]
assistant_tokens = ["aider", "claude"]
prompt_debounce_bytes = 5

[adaptive]
escalate_quality = 0.75

[quality.topic_patterns]
graphs = ['\bdijkstra\b', '\bbfs\b']
"#
    )
    .unwrap();

    let config = AssayConfig::load(file.path()).unwrap();
    assert_eq!(config.telemetry.assistant_tokens, vec!["aider", "claude"]);
    assert_eq!(config.adaptive.escalate_quality, 0.75);
    assert_eq!(config.adaptive.deescalate_quality, 0.4);
    assert!(config.quality.topic_patterns.contains_key("graphs"));

    let parser = TelemetryParser::new(&config.telemetry).unwrap();
    let metrics = parser.parse(&[
        TelemetryEvent::input(0, "aider\r"),
        TelemetryEvent::input(10, "add a cache\r"),
        TelemetryEvent::output(20, "done, anything else?\n$ "),
    ]);
    assert_eq!(metrics.sessions.len(), 1);
    assert_eq!(metrics.sessions[0].end_time, 20);

    let scorer = QualityScorer::new(&config.quality).unwrap();
    let graphs = vec!["graphs".to_string()];
    assert_eq!(scorer.topic_coverage("fn bfs(start: usize) {}", &graphs), 1.0);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = AssayConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.profile.narrative_timeout_seconds, 90);
    assert!(matches!(
        AssayConfig::load(&dir.path().join("absent.toml")),
        Err(AssayError::Io(_))
    ));
}

#[test]
fn test_bad_patterns_surface_as_config_errors() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[telemetry]\nprompt_pattern = \"([\"").unwrap();

    let config = AssayConfig::load(file.path()).unwrap();
    assert!(matches!(
        TelemetryParser::new(&config.telemetry),
        Err(AssayError::Config(_))
    ));
}
