//! Placeholder used when the crate is built without winpty support.

use std::ffi::OsString;

use crate::args::PtyArgs;
use crate::error::{PtyError, Result};

pub struct WinPtySession;

impl WinPtySession {
    pub fn new(_args: &PtyArgs) -> Result<Self> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn spawn(
        &mut self,
        _appname: OsString,
        _cmdline: Option<OsString>,
        _cwd: Option<OsString>,
        _env: Option<OsString>,
    ) -> Result<bool> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn set_size(&mut self, _cols: i32, _rows: i32) -> Result<()> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn read(&self, _length: u32, _blocking: bool) -> Result<Vec<u8>> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn read_stderr(&self, _length: u32, _blocking: bool) -> Result<Vec<u8>> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn write(&self, _data: &[u8]) -> Result<u32> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn is_alive(&mut self) -> Result<bool> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn is_eof(&mut self) -> Result<bool> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn get_exitstatus(&mut self) -> Result<Option<u32>> {
        Err(PtyError::BackendNotCompiled("winpty"))
    }

    pub fn pid(&self) -> u32 {
        0
    }

    pub fn size(&self) -> (i32, i32) {
        (0, 0)
    }
}
