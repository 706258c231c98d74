//! End-to-end pipeline behavior against in-memory capabilities: partial
//! failure tolerance, persistence, notification policy and the
//! report-only path.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use vigil_common::config::Config;
use vigil_common::model::{PortKey, Protocol};
use vigil_core::report;
use vigil_core::store::RunStore;
use vigil_core::{Pipeline, PipelineError};

use vigil_integration_tests::{RecordingMessenger, ScriptedEngine};

fn ip(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
}

/// A config pointed at a scratch report directory, with interface
/// auto-discovery off so only the scripted ranges are scanned.
fn config(report_dir: &std::path::Path, ranges: &[&str]) -> Config {
    let mut config = Config::default();
    config.scan.network_ranges = ranges.iter().map(|s| s.to_string()).collect();
    config.scan.auto_discover = false;
    config.scan.host_timeout_secs = 5;
    config.scan.discovery_timeout_secs = 5;
    config.report.directory = report_dir.to_string_lossy().into_owned();
    config.email.recipients = vec!["sec@example.com".into()];
    config
}

fn pipeline(
    config: Config,
    engine: ScriptedEngine,
    messenger: Arc<RecordingMessenger>,
) -> Pipeline {
    Pipeline::new(Arc::new(config), Arc::new(engine), messenger)
}

#[tokio::test]
async fn full_run_scans_persists_and_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(1), ip(2)])
        .with_open_ports(&[22, 80]);
    let messenger = Arc::new(RecordingMessenger::new());

    let outcome = pipeline(config(dir.path(), &["10.0.0.0/24"]), engine, messenger.clone())
        .run()
        .await
        .unwrap();

    // scores: ssh(2) + http(1) = 3 per host, below the default alert threshold
    assert_eq!(outcome.summary.total_hosts, 2);
    assert_eq!(outcome.summary.total_open_ports, 4);
    assert_eq!(outcome.summary.medium_risk_findings, 2);
    assert!(outcome.report_path.exists());

    let sent = messenger.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("0 High Risk Issues Found"));
    assert_eq!(sent[0].attachment.as_deref(), Some(outcome.report_path.as_path()));
    assert!(sent[0].body.contains("TOP VULNERABLE HOSTS:"));
}

#[tokio::test]
async fn failing_host_and_failing_range_do_not_poison_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(1), ip(2), ip(3)])
        .with_open_ports(&[23])
        .failing_host(ip(2))
        .failing_range("192.168.5.0/24");
    let messenger = Arc::new(RecordingMessenger::new());

    let outcome = pipeline(
        config(dir.path(), &["10.0.0.0/24", "192.168.5.0/24"]),
        engine,
        messenger.clone(),
    )
    .run()
    .await
    .unwrap();

    // the persisted run carries the full picture
    let run = RunStore::load(&outcome.report_path).unwrap();
    assert_eq!(run.scan_metadata.total_networks, 2);
    assert_eq!(
        run.scan_metadata.skipped["192.168.5.0/24"],
        "capability unavailable: engine unreachable"
    );

    let hosts = &run.results["10.0.0.0/24"].hosts;
    assert_eq!(hosts.len(), 3);
    assert!(hosts[&ip(2)].is_failed());
    let telnet = PortKey::new(23, Protocol::Tcp);
    assert!(hosts[&ip(1)].ports.contains_key(&telnet));
    assert!(hosts[&ip(3)].ports.contains_key(&telnet));

    // failed host contributes no findings, the others still rank
    assert_eq!(outcome.summary.hosts.len(), 2);
}

#[tokio::test]
async fn disabled_notifications_never_touch_the_messenger() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(1)])
        .with_open_ports(&[80]);
    let messenger = Arc::new(RecordingMessenger::new());

    let mut cfg = config(dir.path(), &["10.0.0.0/24"]);
    cfg.email.enabled = false;

    let outcome = pipeline(cfg, engine, messenger.clone()).run().await.unwrap();

    assert!(outcome.report_path.exists());
    assert_eq!(messenger.call_count(), 0);
}

#[tokio::test]
async fn notification_failure_still_counts_as_a_successful_run() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(1)])
        .with_open_ports(&[80]);
    let messenger = Arc::new(RecordingMessenger::failing());

    let outcome = pipeline(config(dir.path(), &["10.0.0.0/24"]), engine, messenger.clone())
        .run()
        .await;

    let outcome = outcome.expect("delivery failure must not fail the run");
    assert!(outcome.report_path.exists());
    assert_eq!(messenger.call_count(), 1);
}

#[tokio::test]
async fn unwritable_report_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    // occupy the report directory path with a plain file
    let blocked = dir.path().join("reports");
    std::fs::write(&blocked, b"in the way").unwrap();

    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(1)])
        .with_open_ports(&[80]);
    let messenger = Arc::new(RecordingMessenger::new());

    let result = pipeline(config(&blocked, &["10.0.0.0/24"]), engine, messenger.clone())
        .run()
        .await;

    assert!(matches!(result, Err(PipelineError::Store(_))));
    // nothing was worth notifying about
    assert_eq!(messenger.call_count(), 0);
}

#[tokio::test]
async fn summary_survives_the_persisted_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(5), ip(2), ip(8)])
        .with_open_ports(&[23, 22]);
    let messenger = Arc::new(RecordingMessenger::new());

    let outcome = pipeline(config(dir.path(), &["10.0.0.0/24"]), engine, messenger)
        .run()
        .await
        .unwrap();

    let reloaded = RunStore::load(&outcome.report_path).unwrap();
    let recomputed = report::summarize(&reloaded);

    assert_eq!(recomputed, outcome.summary);
    assert_eq!(
        serde_json::to_vec(&recomputed).unwrap(),
        serde_json::to_vec(&outcome.summary).unwrap()
    );
    // equal scores rank by ascending address
    let order: Vec<IpAddr> = recomputed.hosts.iter().map(|h| h.ip).collect();
    assert_eq!(order, vec![ip(2), ip(5), ip(8)]);
}

#[tokio::test]
async fn crossing_the_alert_threshold_sends_an_urgent_second_message() {
    let dir = tempfile::tempdir().unwrap();
    // telnet + smb: score 6, threshold lowered to match
    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(1)])
        .with_open_ports(&[23, 445]);
    let messenger = Arc::new(RecordingMessenger::new());

    let mut cfg = config(dir.path(), &["10.0.0.0/24"]);
    cfg.alerts.score_threshold = 6;

    pipeline(cfg, engine, messenger.clone()).run().await.unwrap();

    let sent = messenger.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].subject.contains("Network Scan Complete"));
    assert!(sent[1].subject.contains("URGENT - Security Alert: High Risk Host Detected"));
    assert!(sent[1].body.contains("risk score 6"));
}

#[tokio::test]
async fn report_only_reprocesses_a_saved_run_without_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScriptedEngine::new()
        .with_range("10.0.0.0/24", &[ip(1)])
        .with_open_ports(&[21, 443]);
    let first_messenger = Arc::new(RecordingMessenger::new());

    let outcome = pipeline(
        config(dir.path(), &["10.0.0.0/24"]),
        engine,
        first_messenger,
    )
    .run()
    .await
    .unwrap();

    // a fresh pipeline whose engine would find nothing: the saved file
    // alone feeds the report
    let second_messenger = Arc::new(RecordingMessenger::new());
    let summary = pipeline(
        config(dir.path(), &["10.0.0.0/24"]),
        ScriptedEngine::new(),
        second_messenger.clone(),
    )
    .report_only(&outcome.report_path)
    .await
    .unwrap();

    assert_eq!(summary, outcome.summary);
    let sent = second_messenger.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].attachment.as_deref(),
        Some(outcome.report_path.as_path())
    );
}

#[tokio::test]
async fn report_only_surfaces_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();
    let messenger = Arc::new(RecordingMessenger::new());

    let result = pipeline(
        config(dir.path(), &["10.0.0.0/24"]),
        ScriptedEngine::new(),
        messenger.clone(),
    )
    .report_only(&dir.path().join("missing.json"))
    .await;

    assert!(matches!(result, Err(PipelineError::Store(_))));
    assert_eq!(messenger.call_count(), 0);
}
