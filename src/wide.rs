//! Wide-string helpers for the process-creation surface.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

/// NUL-terminated UTF-16 buffer for a single string argument.
pub fn wide_nul(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

/// Environment block for `CreateProcessW`-style calls: `NAME=VALUE` entries
/// separated by NULs, terminated by an empty entry. The trailing double NUL is
/// always appended, so callers pass the entries with single NUL separators.
pub fn environment_block(env: &OsStr) -> Vec<u16> {
    let mut block: Vec<u16> = env.encode_wide().collect();
    block.push(0);
    block.push(0);
    block
}
