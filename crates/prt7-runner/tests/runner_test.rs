//! Integration tests for the runner: config files, file sources and reports.

use std::io::Write;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use prt7_decoder::SessionEnd;
use prt7_runner::{decode, encode_lines, Report, RunnerConfig, RunnerError, SourceConfig};

fn capture_file(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents).expect("write capture");
    file.flush().expect("flush capture");
    file
}

#[test]
fn test_decode_capture_file() {
    let capture = capture_file(b"L,H\r\nL,O\r\nL,L\r\nL,A\r\n");
    let config = RunnerConfig {
        source: SourceConfig::Path {
            path: capture.path().to_path_buf(),
        },
        ..RunnerConfig::default()
    };

    let outcome = decode(&config, None).expect("decode should succeed");
    assert_eq!(outcome.message, "HOLA");
    assert_eq!(outcome.stats.loads_applied, 4);
}

#[test]
fn test_yaml_config_drives_session() {
    let capture = capture_file(b"M,abc\r\nL,A\r\nL,B\r\nL,C\r\n");
    let yaml = format!(
        "source:\n  type: path\n  path: {}\ndecoder:\n  max_lines: 3\n  rotation_policy: strict\n",
        capture.path().display()
    );
    let config_file = capture_file(yaml.as_bytes());

    let config = RunnerConfig::from_file(config_file.path()).expect("valid config");
    let outcome = decode(&config, None).expect("decode should succeed");

    assert_eq!(outcome.message, "AB");
    assert_eq!(outcome.stats.invalid_rotations, 1);
}

#[test]
fn test_missing_source_is_open_error() {
    let config = RunnerConfig {
        source: SourceConfig::Path {
            path: PathBuf::from("/nonexistent/prt7/device"),
        },
        ..RunnerConfig::default()
    };
    assert!(matches!(
        decode(&config, None),
        Err(RunnerError::OpenSource { .. })
    ));
}

#[test]
fn test_missing_config_file() {
    assert!(matches!(
        RunnerConfig::from_file("/nonexistent/prt7.yaml"),
        Err(RunnerError::ConfigRead { .. })
    ));
}

#[test]
fn test_encode_then_decode_through_file() {
    let lines = encode_lines("ATTACK AT DAWN", -5, 3).expect("encodable");
    let mut wire = Vec::new();
    for line in &lines {
        wire.extend_from_slice(line.as_bytes());
        wire.extend_from_slice(b"\r\n");
    }
    let capture = capture_file(&wire);

    let config = RunnerConfig {
        source: SourceConfig::Path {
            path: capture.path().to_path_buf(),
        },
        ..RunnerConfig::default()
    };
    let outcome = decode(&config, None).expect("decode should succeed");
    assert_eq!(outcome.message, "ATTACK AT DAWN");
}

#[test]
fn test_decode_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();

    let sender = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        stream.write_all(b"M,1\r\nL,N\r\nL,J\r\n").expect("send frames");
    });

    let config = RunnerConfig {
        source: SourceConfig::Tcp {
            address,
            read_timeout_ms: Some(5_000),
        },
        ..RunnerConfig::default()
    };
    let outcome = decode(&config, None).expect("decode should succeed");
    sender.join().expect("sender thread");

    assert_eq!(outcome.message, "OK");
}

#[test]
fn test_stop_flag_ends_decode_while_sender_stays_silent() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local addr").to_string();
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);

    let sender = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        stream.write_all(b"L,O\r\nL,K\r\n").expect("send frames");
        // Keep the connection open without sending anything else.
        let _ = release_rx.recv();
    });

    let stop = Arc::new(AtomicBool::new(false));
    let raiser = {
        let stop = stop.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            stop.store(true, Ordering::Relaxed);
        })
    };

    let config = RunnerConfig {
        source: SourceConfig::Tcp {
            address,
            read_timeout_ms: None,
        },
        ..RunnerConfig::default()
    };
    let started = Instant::now();
    let outcome = decode(&config, Some(stop)).expect("decode should succeed");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(outcome.end, Some(SessionEnd::Stopped));
    assert_eq!(outcome.message, "OK");

    raiser.join().expect("raiser thread");
    release_tx.send(()).expect("release sender");
    sender.join().expect("sender thread");
}

#[test]
fn test_report_saved() {
    let capture = capture_file(b"L,A\r\nZ,1\r\n");
    let source = SourceConfig::Path {
        path: capture.path().to_path_buf(),
    };
    let config = RunnerConfig {
        source: source.clone(),
        ..RunnerConfig::default()
    };
    let outcome = decode(&config, None).expect("decode should succeed");

    let dir = tempfile::tempdir().expect("temp dir");
    let report_path = dir.path().join("report.json");
    Report::new(&source, outcome).save(&report_path).expect("save report");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read report"))
            .expect("valid JSON");
    assert_eq!(json["message"], "A");
    assert_eq!(json["stats"]["unknown_commands"], 1);
}
