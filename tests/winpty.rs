//! End-to-end tests for the winpty agent backend.
//!
//! These need winpty.dll and winpty-agent.exe on the DLL search path, so the
//! whole file is gated on the `winpty` feature.
#![cfg(all(windows, feature = "winpty"))]

use std::ffi::OsString;
use std::time::{Duration, Instant};

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wpty::{AgentConfig, Pty, PtyArgs, PtyBackend, PtyError};

const CMD: &str = "C:\\Windows\\System32\\cmd.exe";

fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn new_winpty() -> Pty {
    init_tracing();
    Pty::with_backend(&PtyArgs::new(80, 25), PtyBackend::WinPty).unwrap()
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
fn explicit_request_reports_backend_identity() {
    // Pinning winpty must stick even on a host that also has ConPTY.
    let pty = new_winpty();
    assert_eq!(pty.backend(), PtyBackend::WinPty);
}

#[test]
fn auto_selection_falls_back_to_winpty() {
    // Observable only when the pseudo console is not the preferred pick.
    if cfg!(feature = "conpty") && wpty::conpty_available() {
        return;
    }
    let pty = Pty::new(&PtyArgs::new(80, 25)).unwrap();
    assert_eq!(pty.backend(), PtyBackend::WinPty);
}

#[test]
fn construction_validates_geometry_first() {
    let err = Pty::with_backend(&PtyArgs::new(80, -1), PtyBackend::WinPty).unwrap_err();
    assert!(matches!(err, PtyError::InvalidSize { cols: 80, rows: -1 }));
}

#[test]
fn fresh_session_has_no_process() {
    let mut pty = new_winpty();
    assert_eq!(pty.pid(), 0);
    assert_eq!(pty.get_exitstatus().unwrap(), None);
    assert!(!pty.is_alive().unwrap());
    assert!(!pty.is_eof().unwrap());
}

#[test]
fn spawn_starts_a_live_child() {
    let mut pty = new_winpty();
    spawn_cmd(&mut pty);
    assert_ne!(pty.pid(), 0);
    assert!(pty.is_alive().unwrap());
    assert!(!pty.is_eof().unwrap());
}

#[test]
fn double_spawn_is_rejected() {
    let mut pty = new_winpty();
    spawn_cmd(&mut pty);
    let first_pid = pty.pid();
    let err = pty.spawn(OsString::from(CMD), None, None, None).unwrap_err();
    assert!(matches!(err, PtyError::AlreadySpawned(pid) if pid == first_pid));
    assert_eq!(pty.pid(), first_pid);
}

#[test]
fn echo_round_trip() {
    let mut pty = new_winpty();
    spawn_cmd(&mut pty);
    read_until(&mut pty, ">", Duration::from_secs(10));
    pty.write(b"echo marker-2748\r\n").unwrap();
    let out = read_until(&mut pty, "marker-2748", Duration::from_secs(10));
    assert!(out.contains("marker-2748"));
}

#[test]
fn non_blocking_read_never_stalls() {
    let pty = new_winpty();
    // No child, nothing queued: must come back promptly and empty.
    let start = Instant::now();
    let chunk = pty.read(4096, false).unwrap();
    assert!(chunk.is_empty());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn invalid_resize_keeps_session_usable() {
    let mut pty = new_winpty();
    let err = pty.set_size(-3, 30).unwrap_err();
    assert!(matches!(err, PtyError::InvalidSize { cols: -3, rows: 30 }));
    assert_eq!(pty.size(), (80, 25));
    pty.set_size(120, 50).unwrap();
    assert_eq!(pty.size(), (120, 50));
}

#[test]
fn exit_status_becomes_stable_after_exit() {
    let mut pty = new_winpty();
    pty.spawn(
        OsString::from(CMD),
        Some(OsString::from("cmd.exe /c exit 3")),
        None,
        None,
    )
    .unwrap();
    let start = Instant::now();
    while pty.is_alive().unwrap() {
        assert!(start.elapsed() < Duration::from_secs(10), "child never exited");
        std::thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(pty.get_exitstatus().unwrap(), Some(3));
    // The answer must not change once the exit was observed.
    assert_eq!(pty.get_exitstatus().unwrap(), Some(3));
}

#[test]
fn stderr_needs_the_conerr_flag() {
    let pty = new_winpty();
    let err = pty.read_stderr(128, false).unwrap_err();
    assert!(matches!(err, PtyError::StderrUnsupported("winpty")));
}

#[test]
fn conerr_flag_opens_the_stderr_channel() {
    init_tracing();
    let mut args = PtyArgs::new(80, 25);
    args.agent_config = AgentConfig::COLOR_ESCAPES | AgentConfig::CONERR;
    let pty = Pty::with_backend(&args, PtyBackend::WinPty).unwrap();
    // The channel exists even before a child runs; with nothing queued a
    // non-blocking read is an empty success, not StderrUnsupported.
    let chunk = pty.read_stderr(128, false).unwrap();
    assert!(chunk.is_empty());
}
