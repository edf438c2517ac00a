use std::sync::{Arc, Mutex};

use archival_zone::ingestion::{
    ingest, ingest_one, FileObserver, IngestionContext, IngestionObserver, IngestionOptions,
    IngestionSeverity, ProgressCallback,
};
use archival_zone::remote::MemoryStore;
use archival_zone::IngestionError;

#[derive(Default)]
struct RecordingObserver {
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_failure(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &IngestionError,
    ) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(
        &self,
        _ctx: &IngestionContext,
        severity: IngestionSeverity,
        _error: &IngestionError,
    ) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn store() -> MemoryStore {
    MemoryStore::new()
        .with_file("/wy20/1.csv", "ts,v\n2020-01-01 00:00:00,1\n")
        .with_file("/wy20/2.txt", "skip me")
        .with_file("/wy20/3.csv", "ts,v\n2020-01-01 01:00:00,2\n")
        .with_file("/wy20/bad.csv", "ts,v\nnope,1\n")
        .with_unavailable("/wy20/offline.csv")
}

#[test]
fn observer_receives_failure_and_alert_on_remote_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    let _ = ingest_one(&store(), "/wy20/offline.csv", &opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Critical]);
    assert_eq!(alerts, vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_does_not_alert_below_threshold() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    };

    let _ = ingest_one(&store(), "/wy20/bad.csv", &opts).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn alert_threshold_can_be_lowered() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Error,
        ..Default::default()
    };

    let _ = ingest_one(&store(), "/wy20/bad.csv", &opts).unwrap_err();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Error]);
}

#[test]
fn progress_is_reported_in_input_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let opts = IngestionOptions {
        observer: Some(Arc::new(ProgressCallback::new(move |path: &str| {
            sink.lock().unwrap().push(path.to_string())
        }))),
        ..Default::default()
    };

    let paths = ["/wy20/3.csv", "/wy20/2.txt", "/wy20/1.csv"];
    let tables = ingest(&store(), &paths, &opts).unwrap();

    assert_eq!(tables.len(), 2);
    assert_eq!(*seen.lock().unwrap(), vec!["/wy20/3.csv", "/wy20/1.csv"]);
}

#[test]
fn file_observer_writes_progress_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("ingest.log");
    let opts = IngestionOptions {
        observer: Some(Arc::new(FileObserver::new(&log))),
        ..Default::default()
    };

    let paths = ["/wy20/1.csv", "/wy20/2.txt", "/wy20/offline.csv"];
    let _ = ingest(&store(), &paths, &opts).unwrap_err();

    let text = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("ok kind=Csv path=/wy20/1.csv rows=1"));
    assert!(lines[1].ends_with("skip path=/wy20/2.txt"));
    assert!(lines[2].contains("fail severity=Critical kind=Csv path=/wy20/offline.csv"));
    assert!(lines[3].contains("ALERT severity=Critical"));
}
