//! Raw byte I/O on a PTY stream handle.
//!
//! Both backends hand their stream endpoints to [`PipeStream`], which hides
//! the one place where they differ: how "bytes currently available" is
//! queried. ConPTY endpoints are anonymous pipes and answer to
//! `PeekNamedPipe`; the winpty endpoints are opened with `CreateFileW` and
//! answer to `GetFileSizeEx`.

use windows::Win32::Storage::FileSystem::{GetFileSizeEx, ReadFile, WriteFile};
use windows::Win32::System::Pipes::PeekNamedPipe;

use crate::error::{os_error, PtyError, Result};
use crate::handle::OwnedHandle;

/// Which availability probe the stream handle supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Anonymous pipe end, probed with `PeekNamedPipe`.
    AnonymousPipe,
    /// File-like handle (winpty named-pipe endpoint), probed with
    /// `GetFileSizeEx`.
    FileLike,
}

/// One exclusively-owned stream endpoint of a PTY session.
pub struct PipeStream {
    handle: OwnedHandle,
    kind: StreamKind,
}

impl PipeStream {
    pub fn new(handle: OwnedHandle, kind: StreamKind) -> Self {
        Self { handle, kind }
    }

    /// Number of bytes currently queued on the stream, without consuming them.
    pub fn available(&self) -> Result<u32> {
        match self.kind {
            StreamKind::AnonymousPipe => {
                let mut bytes: u32 = 0;
                unsafe {
                    PeekNamedPipe(self.handle.raw(), None, 0, None, Some(&mut bytes), None)
                        .map_err(|e| PtyError::Read(os_error(e)))?;
                }
                Ok(bytes)
            }
            StreamKind::FileLike => {
                let mut size: i64 = 0;
                unsafe {
                    GetFileSizeEx(self.handle.raw(), &mut size)
                        .map_err(|e| PtyError::Read(os_error(e)))?;
                }
                Ok(size as u32)
            }
        }
    }

    /// Read at most `length` bytes from the stream.
    ///
    /// A non-blocking read first probes the queued byte count and clamps
    /// `length` to it, so it never stalls waiting for data; with nothing
    /// queued it returns an empty buffer without issuing an OS read. A
    /// blocking read skips the probe and suspends until at least one byte
    /// arrives or the stream closes.
    pub fn read(&self, length: u32, blocking: bool) -> Result<Vec<u8>> {
        let mut length = length;
        if !blocking {
            length = length.min(self.available()?);
            if length == 0 {
                return Ok(Vec::new());
            }
        }

        let mut buf = vec![0u8; length as usize];
        let mut read: u32 = 0;
        unsafe {
            ReadFile(self.handle.raw(), Some(&mut buf), Some(&mut read), None)
                .map_err(|e| PtyError::Read(os_error(e)))?;
        }
        buf.truncate(read as usize);
        Ok(buf)
    }

    /// Write the whole byte range in a single OS call. Partial writes show up
    /// in the returned count, not as failures.
    pub fn write(&self, data: &[u8]) -> Result<u32> {
        let mut written: u32 = 0;
        unsafe {
            WriteFile(self.handle.raw(), Some(data), Some(&mut written), None)
                .map_err(|e| PtyError::Write(os_error(e)))?;
        }
        Ok(written)
    }
}
