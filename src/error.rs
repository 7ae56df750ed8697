//! Error taxonomy shared by both PTY backends.

use std::io;

use thiserror::Error;

/// Errors raised while creating or operating a pseudo-terminal session.
#[derive(Error, Debug)]
pub enum PtyError {
    /// Geometry must be strictly positive in both dimensions. Checked before
    /// any OS call is made.
    #[error("PTY cols and rows must be positive and non-zero, got ({cols}, {rows})")]
    InvalidSize { cols: i32, rows: i32 },

    /// A session hosts at most one child process for its whole lifetime.
    #[error("A process was already spawned in this PTY (pid {0})")]
    AlreadySpawned(u32),

    /// The requested backend exists in this build but the host cannot run it.
    #[error("The {0} backend is not supported on this host")]
    UnsupportedBackend(&'static str),

    /// The requested backend was not compiled into this build.
    #[error("wpty was compiled without {0} support")]
    BackendNotCompiled(&'static str),

    /// Automatic selection found no usable backend.
    #[error("No PTY backend is available on this host")]
    NoBackend,

    #[error("Failed to create pipe: {0}")]
    PipeCreation(#[source] io::Error),

    #[error("Failed to open {name} pipe: {source}")]
    PipeOpen {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create pseudo console: {0}")]
    ConsoleCreation(#[source] io::Error),

    #[error("Failed to spawn process: {0}")]
    Spawn(#[source] io::Error),

    #[error("Failed to read from PTY: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write to PTY: {0}")]
    Write(#[source] io::Error),

    #[error("Failed to resize PTY: {0}")]
    Resize(#[source] io::Error),

    #[error("Failed to query process status: {0}")]
    Status(#[source] io::Error),

    /// The winpty agent reported a failure. Carries the library's own error
    /// code next to its message.
    #[error("winpty agent error: {message} (code {code})")]
    Agent { code: u32, message: String },

    /// The active backend has no separate error channel.
    #[error("Stderr reading is not supported by the {0} backend")]
    StderrUnsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// Translate a Windows API error into the `io::Error` carried by I/O variants.
#[cfg(windows)]
pub(crate) fn os_error(err: windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(err.code().0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_size_names_both_dimensions() {
        let err = PtyError::InvalidSize { cols: 0, rows: -3 };
        assert_eq!(
            err.to_string(),
            "PTY cols and rows must be positive and non-zero, got (0, -3)"
        );
    }

    #[test]
    fn agent_error_carries_code_and_message() {
        let err = PtyError::Agent {
            code: 5,
            message: "agent timed out".into(),
        };
        let text = err.to_string();
        assert!(text.contains("agent timed out"));
        assert!(text.contains("code 5"));
    }
}
