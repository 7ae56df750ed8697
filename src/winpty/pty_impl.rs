//! Session over the winpty agent and its named pipes.

use std::ffi::{OsStr, OsString};
use std::ptr;
use std::slice;

use tracing::{debug, info};

use windows::core::PCWSTR;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_GENERIC_READ, FILE_GENERIC_WRITE, FILE_SHARE_NONE,
    OPEN_EXISTING,
};

use super::bindings;
use crate::args::{check_size, AgentConfig, PtyArgs};
use crate::error::{os_error, PtyError, Result};
use crate::handle::OwnedHandle;
use crate::process::ChildProcess;
use crate::stream::{PipeStream, StreamKind};
use crate::wide;

/// Owning pointer to the agent object; `winpty_free` breaks the agent
/// connection, which closes the agent console and any process attached to it.
struct Agent(*mut bindings::winpty_t);

impl Agent {
    fn conin_name(&self) -> *const u16 {
        unsafe { bindings::winpty_conin_name(self.0) }
    }

    fn conout_name(&self) -> *const u16 {
        unsafe { bindings::winpty_conout_name(self.0) }
    }

    fn conerr_name(&self) -> *const u16 {
        unsafe { bindings::winpty_conerr_name(self.0) }
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        unsafe { bindings::winpty_free(self.0) }
    }
}

// Safety: winpty.h documents the winpty_t object as thread-safe.
unsafe impl Send for Agent {}

/// Consume a winpty error object into [`PtyError::Agent`], freeing it.
fn take_error(err: bindings::winpty_error_ptr_t) -> PtyError {
    if err.is_null() {
        return PtyError::Agent {
            code: 0,
            message: "unknown winpty error".into(),
        };
    }
    unsafe {
        let code = bindings::winpty_error_code(err);
        let msg = bindings::winpty_error_msg(err);
        let message = if msg.is_null() {
            String::from("unknown winpty error")
        } else {
            let len = (0..).take_while(|&i| *msg.add(i) != 0).count();
            String::from_utf16_lossy(slice::from_raw_parts(msg, len))
        };
        bindings::winpty_error_free(err);
        PtyError::Agent { code, message }
    }
}

/// Open one of the agent's named-pipe endpoints as a stream handle.
fn open_pipe(name: *const u16, write: bool, label: &'static str) -> Result<PipeStream> {
    let access = if write {
        FILE_GENERIC_WRITE
    } else {
        FILE_GENERIC_READ
    };
    let handle = unsafe {
        CreateFileW(
            PCWSTR(name),
            access.0,
            FILE_SHARE_NONE,
            None,
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            None,
        )
    }
    .map_err(|e| PtyError::PipeOpen {
        name: label,
        source: os_error(e),
    })?;
    Ok(PipeStream::new(
        OwnedHandle::new(handle),
        StreamKind::FileLike,
    ))
}

/// A pseudo-terminal session driven by the winpty agent.
///
/// Field order is drop order: the child's process handle and the pipe
/// endpoints are released before the agent connection is broken.
pub struct WinPtySession {
    child: Option<ChildProcess>,
    conin: PipeStream,
    conout: PipeStream,
    conerr: Option<PipeStream>,
    agent: Agent,
    cols: i32,
    rows: i32,
}

impl WinPtySession {
    /// Configure and start the agent, then open the named pipes it
    /// publishes. The conerr pipe exists only when the `CONERR` agent flag
    /// was requested.
    pub fn new(args: &PtyArgs) -> Result<Self> {
        args.check_size()?;

        unsafe {
            let mut err: bindings::winpty_error_ptr_t = ptr::null_mut();
            let config = bindings::winpty_config_new(args.agent_config.bits(), &mut err);
            if config.is_null() {
                return Err(take_error(err));
            }

            bindings::winpty_config_set_initial_size(config, args.cols, args.rows);
            bindings::winpty_config_set_mouse_mode(config, args.mouse_mode as i32);
            bindings::winpty_config_set_agent_timeout(config, args.timeout);

            let mut err: bindings::winpty_error_ptr_t = ptr::null_mut();
            let handle = bindings::winpty_open(config, &mut err);
            bindings::winpty_config_free(config);
            if handle.is_null() {
                return Err(take_error(err));
            }
            let agent = Agent(handle);
            debug!(cols = args.cols, rows = args.rows, "started winpty agent");

            let conin = open_pipe(agent.conin_name(), true, "conin")?;
            let conout = open_pipe(agent.conout_name(), false, "conout")?;
            let conerr = if args.agent_config.contains(AgentConfig::CONERR) {
                let name = agent.conerr_name();
                if name.is_null() {
                    None
                } else {
                    Some(open_pipe(name, false, "conerr")?)
                }
            } else {
                None
            };

            Ok(Self {
                child: None,
                conin,
                conout,
                conerr,
                agent,
                cols: args.cols,
                rows: args.rows,
            })
        }
    }

    /// Ask the agent to spawn a child attached to its console.
    ///
    /// `appname` may be empty for this backend; the agent then resolves the
    /// executable from the command line. The returned process handle is a
    /// duplicate owned by this session.
    pub fn spawn(
        &mut self,
        appname: OsString,
        cmdline: Option<OsString>,
        cwd: Option<OsString>,
        env: Option<OsString>,
    ) -> Result<bool> {
        if let Some(child) = &self.child {
            return Err(PtyError::AlreadySpawned(child.pid()));
        }

        let app_wide = (!appname.is_empty()).then(|| wide::wide_nul(&appname));
        let cmd_wide = wide::wide_nul(cmdline.as_deref().unwrap_or(OsStr::new("")));
        let cwd_wide = cwd.as_deref().map(wide::wide_nul);
        let env_wide = env.as_deref().map(wide::environment_block);

        let app_ptr = app_wide.as_ref().map_or(ptr::null(), |v| v.as_ptr());
        let cwd_ptr = cwd_wide.as_ref().map_or(ptr::null(), |v| v.as_ptr());
        let env_ptr = env_wide.as_ref().map_or(ptr::null(), |v| v.as_ptr());

        unsafe {
            let mut err: bindings::winpty_error_ptr_t = ptr::null_mut();
            let config = bindings::winpty_spawn_config_new(
                bindings::WINPTY_SPAWN_FLAG_AUTO_SHUTDOWN
                    | bindings::WINPTY_SPAWN_FLAG_EXIT_AFTER_SHUTDOWN,
                app_ptr,
                cmd_wide.as_ptr(),
                cwd_ptr,
                env_ptr,
                &mut err,
            );
            if config.is_null() {
                return Err(take_error(err));
            }

            let mut process = HANDLE::default();
            let mut err: bindings::winpty_error_ptr_t = ptr::null_mut();
            let succ = bindings::winpty_spawn(
                self.agent.0,
                config,
                &mut process,
                ptr::null_mut(),
                ptr::null_mut(),
                &mut err,
            );
            bindings::winpty_spawn_config_free(config);
            if !succ.as_bool() {
                return Err(take_error(err));
            }

            let child = ChildProcess::new(OwnedHandle::new(process));
            info!(pid = child.pid(), "spawned process in winpty agent");
            self.child = Some(child);
        }

        Ok(true)
    }

    /// Resize the agent's console. The stored geometry is only updated once
    /// the agent accepts the new size.
    pub fn set_size(&mut self, cols: i32, rows: i32) -> Result<()> {
        check_size(cols, rows)?;

        unsafe {
            let mut err: bindings::winpty_error_ptr_t = ptr::null_mut();
            if !bindings::winpty_set_size(self.agent.0, cols, rows, &mut err).as_bool() {
                return Err(take_error(err));
            }
        }

        self.cols = cols;
        self.rows = rows;
        debug!(cols, rows, "resized winpty console");
        Ok(())
    }

    pub fn read(&self, length: u32, blocking: bool) -> Result<Vec<u8>> {
        self.conout.read(length, blocking)
    }

    /// Read from the conerr pipe. Sessions opened without the `CONERR` agent
    /// flag have no error channel.
    pub fn read_stderr(&self, length: u32, blocking: bool) -> Result<Vec<u8>> {
        match &self.conerr {
            Some(stream) => stream.read(length, blocking),
            None => Err(PtyError::StderrUnsupported("winpty")),
        }
    }

    pub fn write(&self, data: &[u8]) -> Result<u32> {
        self.conin.write(data)
    }

    pub fn is_alive(&mut self) -> Result<bool> {
        match &mut self.child {
            Some(child) => child.is_alive(),
            None => Ok(false),
        }
    }

    /// EOF means the output stream is drained and the child has exited. An
    /// empty pipe under a live child is not EOF, and neither is a session
    /// that never spawned.
    pub fn is_eof(&mut self) -> Result<bool> {
        if self.child.is_none() {
            return Ok(false);
        }
        let queued = self.conout.available()?;
        Ok(queued == 0 && !self.is_alive()?)
    }

    pub fn get_exitstatus(&mut self) -> Result<Option<u32>> {
        match &mut self.child {
            Some(child) => child.exit_status(),
            None => Ok(None),
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.as_ref().map_or(0, |child| child.pid())
    }

    pub fn size(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }
}
