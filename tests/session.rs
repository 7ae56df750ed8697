//! End-to-end session tests against a real cmd.exe child.
#![cfg(windows)]

use std::ffi::OsString;
use std::time::{Duration, Instant};

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wpty::{conpty_available, Pty, PtyArgs, PtyBackend, PtyError};

const CMD: &str = "C:\\Windows\\System32\\cmd.exe";

fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn new_pty() -> Pty {
    init_tracing();
    Pty::new(&PtyArgs::new(80, 25)).unwrap()
}

fn spawn_cmd(pty: &mut Pty) {
    pty.spawn(OsString::from(CMD), None, None, None).unwrap();
}

/// Drain output until `needle` shows up, with a deadline so a regression
/// fails the test instead of hanging it.
fn read_until(pty: &mut Pty, needle: &str, deadline: Duration) -> String {
    let start = Instant::now();
    let mut collected = String::new();
    while start.elapsed() < deadline {
        let chunk = pty.read(4096, false).unwrap();
        collected.push_str(&String::from_utf8_lossy(&chunk));
        if collected.contains(needle) {
            return collected;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("did not observe {needle:?} within {deadline:?}; got {collected:?}");
}

#[test]
fn construction_validates_geometry_first() {
    let err = Pty::new(&PtyArgs::new(0, 25)).unwrap_err();
    assert!(matches!(err, PtyError::InvalidSize { cols: 0, rows: 25 }));
}

#[test]
fn fresh_session_has_no_process() {
    let mut pty = new_pty();
    assert_eq!(pty.pid(), 0);
    assert_eq!(pty.get_exitstatus().unwrap(), None);
    assert!(!pty.is_alive().unwrap());
    assert!(!pty.is_eof().unwrap());
}

#[test]
fn auto_selection_reports_backend_identity() {
    // What gets picked depends on the host, so assert the selection rule
    // rather than one fixed backend.
    if conpty_available() {
        assert_eq!(new_pty().backend(), PtyBackend::ConPty);
    } else if cfg!(feature = "winpty") {
        assert_eq!(new_pty().backend(), PtyBackend::WinPty);
    } else {
        let err = Pty::new(&PtyArgs::new(80, 25)).unwrap_err();
        assert!(matches!(err, PtyError::NoBackend));
    }
}

#[test]
fn spawn_starts_a_live_child() {
    let mut pty = new_pty();
    spawn_cmd(&mut pty);
    assert_ne!(pty.pid(), 0);
    assert!(pty.is_alive().unwrap());
    assert!(!pty.is_eof().unwrap());
}

#[test]
fn double_spawn_is_rejected() {
    let mut pty = new_pty();
    spawn_cmd(&mut pty);
    let first_pid = pty.pid();
    let err = pty.spawn(OsString::from(CMD), None, None, None).unwrap_err();
    assert!(matches!(err, PtyError::AlreadySpawned(pid) if pid == first_pid));
    assert_eq!(pty.pid(), first_pid);
}

#[test]
fn echo_round_trip() {
    let mut pty = new_pty();
    spawn_cmd(&mut pty);
    read_until(&mut pty, ">", Duration::from_secs(10));
    pty.write(b"echo marker-1573\r\n").unwrap();
    let out = read_until(&mut pty, "marker-1573", Duration::from_secs(10));
    assert!(out.contains("marker-1573"));
}

#[test]
fn blocking_read_returns_child_output() {
    let mut pty = new_pty();
    spawn_cmd(&mut pty);
    // cmd.exe prints a banner on startup, so the first blocking read has
    // something to hand back.
    let chunk = pty.read(4096, true).unwrap();
    assert!(!chunk.is_empty());
}

#[test]
fn non_blocking_read_never_stalls() {
    let pty = new_pty();
    // No child, nothing queued: must come back promptly and empty.
    let start = Instant::now();
    let chunk = pty.read(4096, false).unwrap();
    assert!(chunk.is_empty());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn stderr_is_unsupported_on_conpty() {
    if !cfg!(feature = "conpty") || !conpty_available() {
        return;
    }
    let pty = Pty::with_backend(&PtyArgs::new(80, 25), PtyBackend::ConPty).unwrap();
    let err = pty.read_stderr(128, false).unwrap_err();
    assert!(matches!(err, PtyError::StderrUnsupported("conpty")));
}

#[test]
fn invalid_resize_keeps_session_usable() {
    let mut pty = new_pty();
    let err = pty.set_size(0, 30).unwrap_err();
    assert!(matches!(err, PtyError::InvalidSize { cols: 0, rows: 30 }));
    assert_eq!(pty.size(), (80, 25));
    pty.set_size(100, 40).unwrap();
    assert_eq!(pty.size(), (100, 40));
}

#[test]
fn exit_status_becomes_stable_after_exit() {
    let mut pty = new_pty();
    pty.spawn(
        OsString::from(CMD),
        Some(OsString::from("cmd.exe /c exit 7")),
        None,
        None,
    )
    .unwrap();
    let start = Instant::now();
    while pty.is_alive().unwrap() {
        assert!(start.elapsed() < Duration::from_secs(10), "child never exited");
        std::thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(pty.get_exitstatus().unwrap(), Some(7));
    // The answer must not change once the exit was observed.
    assert_eq!(pty.get_exitstatus().unwrap(), Some(7));
}

#[test]
fn eof_after_child_exits_and_output_drains() {
    let mut pty = new_pty();
    pty.spawn(
        OsString::from(CMD),
        Some(OsString::from("cmd.exe /c echo done")),
        None,
        None,
    )
    .unwrap();
    let start = Instant::now();
    while !pty.is_eof().unwrap() {
        // Keep draining so buffered output cannot hold EOF off forever.
        pty.read(4096, false).unwrap();
        assert!(start.elapsed() < Duration::from_secs(10), "child never drained");
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(!pty.is_alive().unwrap());
}
