//! Liveness and exit-status tracking for the spawned child.

use windows::Win32::Foundation::STILL_ACTIVE;
use windows::Win32::System::Threading::{GetExitCodeProcess, GetProcessId};

use crate::error::{os_error, PtyError, Result};
use crate::handle::OwnedHandle;

/// The child process attached to a PTY session.
///
/// Liveness is derived lazily: every query polls `GetExitCodeProcess` through
/// [`ChildProcess::is_alive`], the single source of truth for both the
/// explicit liveness check and the exit-status query. Once the process leaves
/// the running state its exit code is captured and reported stably.
pub struct ChildProcess {
    handle: OwnedHandle,
    pid: u32,
    exit_status: Option<u32>,
    alive: bool,
}

impl ChildProcess {
    pub fn new(handle: OwnedHandle) -> Self {
        let pid = unsafe { GetProcessId(handle.raw()) };
        Self {
            handle,
            pid,
            exit_status: None,
            alive: true,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Poll the OS for the process state.
    ///
    /// `STILL_ACTIVE` (259) is the sentinel for a running process; any other
    /// exit code flips the state to exited. A child that really exits with
    /// code 259 is indistinguishable from a running one, a documented Win32
    /// caveat.
    pub fn is_alive(&mut self) -> Result<bool> {
        let mut code: u32 = 0;
        unsafe {
            GetExitCodeProcess(self.handle.raw(), &mut code)
                .map_err(|e| PtyError::Status(os_error(e)))?;
        }
        self.alive = code == STILL_ACTIVE.0 as u32;
        if !self.alive {
            self.exit_status = Some(code);
        }
        Ok(self.alive)
    }

    /// `None` while the process is still running, otherwise the captured exit
    /// code, stable across repeated calls.
    pub fn exit_status(&mut self) -> Result<Option<u32>> {
        if self.alive {
            self.is_alive()?;
        }
        if self.alive {
            return Ok(None);
        }
        Ok(self.exit_status)
    }
}
