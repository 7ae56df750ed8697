//! Unified PTY session over whichever backend the host supports.

use std::ffi::OsString;

use tracing::debug;

use windows::core::{s, w};
use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};

use crate::args::{PtyArgs, PtyBackend};
use crate::conpty::ConPtySession;
use crate::error::{PtyError, Result};
use crate::winpty::WinPtySession;

/// Runtime probe for the pseudo-console API.
///
/// ConPTY availability is a property of the host, not of the build: the
/// export is looked up in kernel32 instead of assuming anything at compile
/// time.
pub fn conpty_available() -> bool {
    unsafe {
        match GetModuleHandleW(w!("kernel32.dll")) {
            Ok(kernel32) => GetProcAddress(kernel32, s!("CreatePseudoConsole")).is_some(),
            Err(_) => false,
        }
    }
}

/// The one backend a [`Pty`] owns. Exactly one variant is ever constructed,
/// so an operation can never run without a backend behind it.
enum BackendSession {
    ConPty(ConPtySession),
    WinPty(WinPtySession),
}

/// A pseudo-terminal session.
///
/// Create one with [`Pty::new`] (automatic backend selection) or
/// [`Pty::with_backend`], spawn a child into it, then talk to the child over
/// [`read`](Pty::read) and [`write`](Pty::write). A session hosts at most one
/// child process; dropping the session releases every OS resource it owns and
/// may terminate a still-running child.
///
/// Sessions are single-threaded by contract: no internal locking is done and
/// concurrent calls from several threads are not supported.
pub struct Pty {
    session: BackendSession,
}

impl Pty {
    /// Create a session, picking the backend automatically: ConPTY when the
    /// host exposes it, otherwise winpty when compiled in.
    pub fn new(args: &PtyArgs) -> Result<Self> {
        args.check_size()?;

        if cfg!(feature = "conpty") && conpty_available() {
            debug!("auto-selected the conpty backend");
            return Ok(Self {
                session: BackendSession::ConPty(ConPtySession::new(args)?),
            });
        }

        if cfg!(feature = "winpty") {
            debug!("auto-selected the winpty backend");
            return Ok(Self {
                session: BackendSession::WinPty(WinPtySession::new(args)?),
            });
        }

        Err(PtyError::NoBackend)
    }

    /// Create a session with an explicitly requested backend. Requesting
    /// ConPTY on a host without it, or a backend not compiled into this
    /// build, is an error rather than a silent fallback.
    pub fn with_backend(args: &PtyArgs, backend: PtyBackend) -> Result<Self> {
        match backend {
            PtyBackend::Auto => Self::new(args),
            PtyBackend::ConPty => {
                if cfg!(feature = "conpty") && !conpty_available() {
                    return Err(PtyError::UnsupportedBackend("conpty"));
                }
                Ok(Self {
                    session: BackendSession::ConPty(ConPtySession::new(args)?),
                })
            }
            PtyBackend::WinPty => Ok(Self {
                session: BackendSession::WinPty(WinPtySession::new(args)?),
            }),
        }
    }

    /// Which backend this session runs on.
    pub fn backend(&self) -> PtyBackend {
        match &self.session {
            BackendSession::ConPty(_) => PtyBackend::ConPty,
            BackendSession::WinPty(_) => PtyBackend::WinPty,
        }
    }

    /// Spawn a child process attached to the session.
    ///
    /// `appname` is the executable path (the winpty backend also accepts an
    /// empty path and resolves it from `cmdline`). Unset `cwd` and `env`
    /// inherit the caller's. A second spawn on the same session is rejected.
    pub fn spawn(
        &mut self,
        appname: OsString,
        cmdline: Option<OsString>,
        cwd: Option<OsString>,
        env: Option<OsString>,
    ) -> Result<bool> {
        match &mut self.session {
            BackendSession::ConPty(s) => s.spawn(appname, cmdline, cwd, env),
            BackendSession::WinPty(s) => s.spawn(appname, cmdline, cwd, env),
        }
    }

    /// Change the terminal geometry. Both dimensions must stay strictly
    /// positive; on failure the previous geometry is kept.
    pub fn set_size(&mut self, cols: i32, rows: i32) -> Result<()> {
        match &mut self.session {
            BackendSession::ConPty(s) => s.set_size(cols, rows),
            BackendSession::WinPty(s) => s.set_size(cols, rows),
        }
    }

    /// Read at most `length` bytes from the child's output stream.
    ///
    /// A blocking read waits for at least one byte. A non-blocking read
    /// returns whatever is queued right now, possibly nothing, without ever
    /// waiting on the child.
    pub fn read(&self, length: u32, blocking: bool) -> Result<Vec<u8>> {
        match &self.session {
            BackendSession::ConPty(s) => s.read(length, blocking),
            BackendSession::WinPty(s) => s.read(length, blocking),
        }
    }

    /// Read from the child's error stream. Only the winpty backend (with the
    /// `CONERR` agent flag) has one; everywhere else this fails with
    /// [`PtyError::StderrUnsupported`].
    pub fn read_stderr(&self, length: u32, blocking: bool) -> Result<Vec<u8>> {
        match &self.session {
            BackendSession::ConPty(s) => s.read_stderr(length, blocking),
            BackendSession::WinPty(s) => s.read_stderr(length, blocking),
        }
    }

    /// Write bytes to the child's input stream, returning how many were
    /// accepted.
    pub fn write(&self, data: &[u8]) -> Result<u32> {
        match &self.session {
            BackendSession::ConPty(s) => s.write(data),
            BackendSession::WinPty(s) => s.write(data),
        }
    }

    /// Whether the child process is still running, observed by polling the
    /// OS on demand.
    pub fn is_alive(&mut self) -> Result<bool> {
        match &mut self.session {
            BackendSession::ConPty(s) => s.is_alive(),
            BackendSession::WinPty(s) => s.is_alive(),
        }
    }

    /// True once the child has exited and no buffered output remains.
    pub fn is_eof(&mut self) -> Result<bool> {
        match &mut self.session {
            BackendSession::ConPty(s) => s.is_eof(),
            BackendSession::WinPty(s) => s.is_eof(),
        }
    }

    /// The child's exit code; `None` until a child was spawned and has been
    /// observed to exit, then stable across repeated calls.
    pub fn get_exitstatus(&mut self) -> Result<Option<u32>> {
        match &mut self.session {
            BackendSession::ConPty(s) => s.get_exitstatus(),
            BackendSession::WinPty(s) => s.get_exitstatus(),
        }
    }

    /// Process identifier of the attached child, 0 before a spawn.
    pub fn pid(&self) -> u32 {
        match &self.session {
            BackendSession::ConPty(s) => s.pid(),
            BackendSession::WinPty(s) => s.pid(),
        }
    }

    /// Current terminal geometry as (cols, rows).
    pub fn size(&self) -> (i32, i32) {
        match &self.session {
            BackendSession::ConPty(s) => s.size(),
            BackendSession::WinPty(s) => s.size(),
        }
    }
}
