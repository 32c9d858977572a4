//! Verify → repair → re-verify with a scripted checker.
#![cfg(unix)]

use std::sync::Arc;

use csp_repair_core::{run_pipeline, BatchRepairer, RepairConfig, RepairError};
use pat_verifier::{load_trace, Verifier, VerifierConfig};
use repair_oracle::fakes::ScriptedOracle;

const COUNTER: &str = "var x = 0;\n\nP() = inc { x = x + 1; } -> P();\n";

/// Fails the bound on original models and passes it on repaired ones.
const CHECKER: &str = r#"case "$3" in
  *repaired_*) echo 'The Assertion P() |= [] x < 5 is VALID.' > "$4" ;;
  *) echo 'The Assertion P() |= [] x < 5 is NOT valid.' > "$4" ;;
esac
"#;

fn setup(dir: &std::path::Path) -> (RepairConfig, Verifier) {
    let models_dir = dir.join("models");
    std::fs::create_dir(&models_dir).unwrap();
    std::fs::write(models_dir.join("counter.csp"), COUNTER).unwrap();

    let checker = dir.join("fake_pat.sh");
    std::fs::write(&checker, CHECKER).unwrap();
    let verifier_config = VerifierConfig::default()
        .with_executable(&checker)
        .with_launcher(Some("sh"))
        .with_timeout_secs(5);

    let config = RepairConfig {
        models_dir,
        output_dir: dir.join("repaired"),
        trace_file: dir.join("mismatch_traces.json"),
        verifier: verifier_config.clone(),
        ..RepairConfig::default()
    };
    (config, Verifier::new(verifier_config))
}

#[tokio::test]
async fn pipeline_repairs_and_reverifies() {
    let dir = tempfile::tempdir().unwrap();
    let (config, verifier) = setup(dir.path());
    let trace_file = config.trace_file.clone();

    let oracle = Arc::new(
        ScriptedOracle::new()
            .with_answer("initialization", "var x = 0;")
            .with_answer("inc", "inc { if (x < 4) { x = x + 1; } }"),
    );
    let repairer = Arc::new(BatchRepairer::new(config, oracle));

    let summary = run_pipeline(&verifier, &repairer, true).await.unwrap();

    assert_eq!(summary.models.len(), 1);
    assert_eq!(summary.verification.records().len(), 1);
    let trace = load_trace(&trace_file).unwrap();
    assert_eq!(trace[0].assertion, "P() |= [] x < 5");

    assert_eq!(summary.batch.applied(), 2);
    assert_eq!(summary.remaining_failures(), Some(0));
}

#[tokio::test]
async fn empty_models_dir_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let (config, verifier) = setup(dir.path());
    std::fs::remove_file(config.models_dir.join("counter.csp")).unwrap();

    let repairer = Arc::new(BatchRepairer::new(config, Arc::new(ScriptedOracle::new())));
    let err = run_pipeline(&verifier, &repairer, false).await.unwrap_err();
    assert!(matches!(err, RepairError::Config(_)));
}

#[tokio::test]
async fn missing_checker_stops_before_repair() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = setup(dir.path());
    let verifier = Verifier::new(
        VerifierConfig::default().with_executable(dir.path().join("absent.exe")),
    );
    let output_dir = config.output_dir.clone();

    let repairer = Arc::new(BatchRepairer::new(config, Arc::new(ScriptedOracle::new())));
    let err = run_pipeline(&verifier, &repairer, false).await.unwrap_err();

    assert!(matches!(err, RepairError::Verifier(_)));
    assert!(!output_dir.exists());
}
