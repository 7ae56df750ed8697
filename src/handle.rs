//! Scope-guarded ownership of raw Windows handles.

use windows::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};

/// A `HANDLE` that is closed when the guard goes out of scope.
///
/// An empty guard (null or `INVALID_HANDLE_VALUE`) closes nothing, so a
/// resource that was never acquired needs no bookkeeping flag. Close failures
/// during drop are ignored; the session is being discarded regardless.
pub struct OwnedHandle(HANDLE);

impl OwnedHandle {
    pub fn new(handle: HANDLE) -> Self {
        Self(handle)
    }

    pub fn raw(&self) -> HANDLE {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.0.is_null() && self.0 != INVALID_HANDLE_VALUE
    }
}

impl Default for OwnedHandle {
    fn default() -> Self {
        Self(HANDLE::default())
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if self.is_valid() {
            unsafe {
                let _ = CloseHandle(self.0);
            }
        }
    }
}

// Safety: the handle is exclusively owned and only released once, on drop.
unsafe impl Send for OwnedHandle {}
