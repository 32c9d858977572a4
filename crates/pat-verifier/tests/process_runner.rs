//! Verifier runs against shell scripts standing in for the PAT console.
//!
//! Scripts are started through `sh`, which plays the launcher role, so with
//! the default argument template the report path arrives as `$4`.
#![cfg(unix)]

use std::path::{Path, PathBuf};

use pat_verifier::{Verifier, VerifierConfig, VerifierError};
use tempfile::TempDir;

fn fixture(script: &str) -> (TempDir, PathBuf, Verifier) {
    let dir = tempfile::tempdir().unwrap();
    let script_path = dir.path().join("fake_pat.sh");
    std::fs::write(&script_path, script).unwrap();

    let model = dir.path().join("leader.csp");
    std::fs::write(&model, "var x = 0;\nP() = e{ x = 1; } -> P();\n").unwrap();

    let verifier = Verifier::new(
        VerifierConfig::default()
            .with_executable(&script_path)
            .with_launcher(Some("sh"))
            .with_timeout_secs(5),
    );
    (dir, model, verifier)
}

fn report_of(model: &Path) -> PathBuf {
    VerifierConfig::report_path(model)
}

#[tokio::test]
async fn failed_assertions_are_recorded_and_report_removed() {
    let (_dir, model, verifier) = fixture(
        r#"[ "$1" = "-csp" ] || exit 2
[ "$2" = "-v" ] || exit 2
cat > "$4" <<EOF
The Assertion System() |= [] one_coordinator is NOT valid.
The Assertion System() deadlockfree is VALID.
The Assertion System() reaches Ready is Invalid.
EOF
"#,
    );

    let outcome = verifier.verify(&model).await.unwrap();
    assert!(outcome.report_found);
    assert_eq!(outcome.exit_code, 0);
    let assertions: Vec<_> = outcome.failures.iter().map(|f| f.assertion.as_str()).collect();
    assert_eq!(
        assertions,
        vec!["System() |= [] one_coordinator", "System() reaches Ready"]
    );
    assert_eq!(outcome.failures[0].source_model, model);
    assert!(!report_of(&model).exists());
    assert!(outcome.warnings.is_empty());
}

#[tokio::test]
async fn clean_report_passes() {
    let (_dir, model, verifier) =
        fixture("echo 'The Assertion System() deadlockfree is VALID.' > \"$4\"\n");
    let outcome = verifier.verify(&model).await.unwrap();
    assert!(outcome.passed());
}

#[tokio::test]
async fn missing_report_is_a_warning_not_an_error() {
    let (_dir, model, verifier) = fixture("exit 3\n");
    let outcome = verifier.verify(&model).await.unwrap();
    assert!(!outcome.report_found);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.exit_code, 3);
    assert!(!outcome.passed());
}

#[tokio::test]
async fn loader_complaints_and_stderr_become_warnings() {
    let (_dir, model, verifier) = fixture(
        "echo 'Could not load file or assembly PAT.Lib'\necho 'mono: oops' >&2\n: > \"$4\"\n",
    );
    let outcome = verifier.verify(&model).await.unwrap();
    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome.warnings[0].contains("Could not load"));
    assert!(outcome.warnings[1].contains("oops"));
}

#[tokio::test]
async fn slow_verifier_times_out() {
    let (_dir, model, verifier) = fixture("sleep 10\n");
    let verifier = Verifier::new(verifier.config().clone().with_timeout_secs(1));
    match verifier.verify(&model).await {
        Err(VerifierError::Timeout { seconds, .. }) => assert_eq!(seconds, 1),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn verify_all_treats_timeout_as_zero_records() {
    let (_dir, model, verifier) = fixture("sleep 10\n");
    let verifier = Verifier::new(verifier.config().clone().with_timeout_secs(1));
    let run = verifier.verify_all(&[model.clone()]).await;
    assert!(run.errors.is_empty());
    assert_eq!(run.outcomes.len(), 1);
    assert!(run.records().is_empty());
}

#[tokio::test]
async fn missing_launcher_is_spawn_error() {
    let (_dir, model, verifier) = fixture("exit 0\n");
    let verifier = Verifier::new(
        verifier
            .config()
            .clone()
            .with_launcher(Some("definitely-not-a-launcher-binary")),
    );
    let run = verifier.verify_all(&[model]).await;
    assert!(run.outcomes.is_empty());
    assert_eq!(run.errors.len(), 1);
    assert!(run.errors[0].1.contains("failed to start verifier"));
}
