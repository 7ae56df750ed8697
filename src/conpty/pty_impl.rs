//! Pseudo-console session over the native ConPTY API.

use std::ffi::{c_void, OsString};
use std::mem;

use tracing::{debug, info};

use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::Console::{
    ClosePseudoConsole, CreatePseudoConsole, ResizePseudoConsole, COORD, HPCON,
};
use windows::Win32::System::Pipes::CreatePipe;
use windows::Win32::System::Threading::{
    CreateProcessW, DeleteProcThreadAttributeList, InitializeProcThreadAttributeList,
    UpdateProcThreadAttribute, CREATE_UNICODE_ENVIRONMENT, EXTENDED_STARTUPINFO_PRESENT,
    LPPROC_THREAD_ATTRIBUTE_LIST, PROCESS_INFORMATION, STARTUPINFOEXW, STARTUPINFOW,
};

use crate::args::{check_size, PtyArgs};
use crate::error::{os_error, PtyError, Result};
use crate::handle::OwnedHandle;
use crate::process::ChildProcess;
use crate::stream::{PipeStream, StreamKind};
use crate::wide;

const PROC_THREAD_ATTRIBUTE_PSEUDOCONSOLE: usize = 0x00020016;

/// `HPCON` guard. Closing the pseudo console also terminates an attached
/// child that is still running; that is intentional teardown, not a leak.
struct PseudoConsole(HPCON);

impl Drop for PseudoConsole {
    fn drop(&mut self) {
        unsafe { ClosePseudoConsole(self.0) }
    }
}

/// Initialized proc-thread attribute list with the pseudo-console attached.
///
/// The backing storage must stay alive for as long as the spawned process
/// might reference it, and must be deleted before the pseudo console is
/// closed; `SpawnedChild`'s field order takes care of both.
struct AttributeList {
    buf: Vec<u8>,
}

impl AttributeList {
    fn for_console(console: HPCON) -> Result<Self> {
        unsafe {
            // Size query; this first call always reports failure.
            let mut size: usize = 0;
            let _ = InitializeProcThreadAttributeList(
                LPPROC_THREAD_ATTRIBUTE_LIST::default(),
                1,
                0,
                &mut size,
            );

            let mut buf = vec![0u8; size];
            let list = LPPROC_THREAD_ATTRIBUTE_LIST(buf.as_mut_ptr() as *mut _);
            InitializeProcThreadAttributeList(list, 1, 0, &mut size)
                .map_err(|e| PtyError::Spawn(os_error(e)))?;
            let mut attrs = Self { buf };

            UpdateProcThreadAttribute(
                attrs.as_list(),
                0,
                PROC_THREAD_ATTRIBUTE_PSEUDOCONSOLE,
                Some(console.0 as *const _),
                mem::size_of::<HPCON>(),
                None,
                None,
            )
            .map_err(|e| PtyError::Spawn(os_error(e)))?;

            Ok(attrs)
        }
    }

    fn as_list(&mut self) -> LPPROC_THREAD_ATTRIBUTE_LIST {
        LPPROC_THREAD_ATTRIBUTE_LIST(self.buf.as_mut_ptr() as *mut _)
    }
}

impl Drop for AttributeList {
    fn drop(&mut self) {
        unsafe { DeleteProcThreadAttributeList(self.as_list()) }
    }
}

/// Everything acquired by a successful spawn. Field order is drop order:
/// process and thread handles close before the attribute list is deleted.
struct SpawnedChild {
    process: ChildProcess,
    #[allow(dead_code)]
    thread: OwnedHandle,
    #[allow(dead_code)]
    attrs: AttributeList,
}

/// A pseudo-terminal session backed by a Windows pseudo console.
///
/// Field order is drop order: the spawned child's handles go first, then the
/// pseudo console (terminating the child if it still runs), then the two
/// retained pipe ends.
pub struct ConPtySession {
    child: Option<SpawnedChild>,
    console: PseudoConsole,
    conin: PipeStream,
    conout: PipeStream,
    cols: i32,
    rows: i32,
}

// Safety: all handles are exclusively owned and the session is used from one
// thread at a time.
unsafe impl Send for ConPtySession {}

impl ConPtySession {
    /// Create the pipe pairs and the pseudo console bound to them.
    ///
    /// The caller keeps the write end of the input pipe and the read end of
    /// the output pipe; the other two ends are duplicated into conhost by
    /// `CreatePseudoConsole` and released here immediately. On any failure
    /// the guards release whatever was already created.
    pub fn new(args: &PtyArgs) -> Result<Self> {
        args.check_size()?;

        unsafe {
            let mut input_read = HANDLE::default();
            let mut input_write = HANDLE::default();
            CreatePipe(&mut input_read, &mut input_write, None, 0)
                .map_err(|e| PtyError::PipeCreation(os_error(e)))?;
            let input_read = OwnedHandle::new(input_read);
            let input_write = OwnedHandle::new(input_write);

            let mut output_read = HANDLE::default();
            let mut output_write = HANDLE::default();
            CreatePipe(&mut output_read, &mut output_write, None, 0)
                .map_err(|e| PtyError::PipeCreation(os_error(e)))?;
            let output_read = OwnedHandle::new(output_read);
            let output_write = OwnedHandle::new(output_write);

            let size = COORD {
                X: args.cols as i16,
                Y: args.rows as i16,
            };
            let handle = CreatePseudoConsole(size, input_read.raw(), output_write.raw(), 0)
                .map_err(|e| PtyError::ConsoleCreation(os_error(e)))?;
            let console = PseudoConsole(handle);

            // conhost holds duplicates of these two ends now.
            drop(input_read);
            drop(output_write);

            debug!(cols = args.cols, rows = args.rows, "created pseudo console");

            Ok(Self {
                child: None,
                console,
                conin: PipeStream::new(input_write, StreamKind::AnonymousPipe),
                conout: PipeStream::new(output_read, StreamKind::AnonymousPipe),
                cols: args.cols,
                rows: args.rows,
            })
        }
    }

    /// Spawn a child process attached to the pseudo console.
    ///
    /// `cwd` and `env` fall back to the caller's own when unset. The command
    /// line is passed through a mutable buffer because `CreateProcessW` may
    /// rewrite it in place.
    pub fn spawn(
        &mut self,
        appname: OsString,
        cmdline: Option<OsString>,
        cwd: Option<OsString>,
        env: Option<OsString>,
    ) -> Result<bool> {
        if let Some(child) = &self.child {
            return Err(PtyError::AlreadySpawned(child.process.pid()));
        }

        // With no explicit command line the child still needs an argv[0], so
        // the application path doubles as the command line.
        let app_wide = wide::wide_nul(&appname);
        let mut cmd_wide = wide::wide_nul(cmdline.as_deref().unwrap_or(appname.as_os_str()));
        let cwd_wide = cwd.as_deref().map(wide::wide_nul);
        let env_wide = env.as_deref().map(wide::environment_block);

        unsafe {
            let mut attrs = AttributeList::for_console(self.console.0)?;

            let startup_info = STARTUPINFOEXW {
                StartupInfo: STARTUPINFOW {
                    cb: mem::size_of::<STARTUPINFOEXW>() as u32,
                    ..Default::default()
                },
                lpAttributeList: attrs.as_list(),
            };

            let mut process_info = PROCESS_INFORMATION::default();
            CreateProcessW(
                PCWSTR(app_wide.as_ptr()),
                PWSTR(cmd_wide.as_mut_ptr()),
                None,
                None,
                false,
                EXTENDED_STARTUPINFO_PRESENT | CREATE_UNICODE_ENVIRONMENT,
                env_wide.as_ref().map(|block| block.as_ptr() as *const c_void),
                cwd_wide
                    .as_ref()
                    .map_or(PCWSTR::null(), |dir| PCWSTR(dir.as_ptr())),
                &startup_info.StartupInfo,
                &mut process_info,
            )
            .map_err(|e| PtyError::Spawn(os_error(e)))?;

            let process = ChildProcess::new(OwnedHandle::new(process_info.hProcess));
            let thread = OwnedHandle::new(process_info.hThread);
            info!(pid = process.pid(), "spawned process in pseudo console");

            self.child = Some(SpawnedChild {
                process,
                thread,
                attrs,
            });
        }

        Ok(true)
    }

    /// Resize the pseudo console. The stored geometry is only updated once
    /// the OS call succeeds.
    pub fn set_size(&mut self, cols: i32, rows: i32) -> Result<()> {
        check_size(cols, rows)?;

        let size = COORD {
            X: cols as i16,
            Y: rows as i16,
        };
        unsafe {
            ResizePseudoConsole(self.console.0, size).map_err(|e| PtyError::Resize(os_error(e)))?;
        }

        self.cols = cols;
        self.rows = rows;
        debug!(cols, rows, "resized pseudo console");
        Ok(())
    }

    pub fn read(&self, length: u32, blocking: bool) -> Result<Vec<u8>> {
        self.conout.read(length, blocking)
    }

    /// ConPTY multiplexes stderr into the output stream; there is no separate
    /// error channel to read.
    pub fn read_stderr(&self, _length: u32, _blocking: bool) -> Result<Vec<u8>> {
        Err(PtyError::StderrUnsupported("conpty"))
    }

    pub fn write(&self, data: &[u8]) -> Result<u32> {
        self.conin.write(data)
    }

    pub fn is_alive(&mut self) -> Result<bool> {
        match &mut self.child {
            Some(child) => child.process.is_alive(),
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
            Some(child) => child.process.exit_status(),
            None => Ok(None),
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.as_ref().map_or(0, |child| child.process.pid())
    }

    pub fn size(&self) -> (i32, i32) {
        (self.cols, self.rows)
    }
}
