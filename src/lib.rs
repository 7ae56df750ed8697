//! Pseudo-terminal sessions for Windows.
//!
//! `wpty` puts one session type, [`Pty`], in front of the two ways a Windows
//! host can provide a PTY:
//!
//! - **conpty**: the in-box pseudo-console (Windows 10 1809 and later),
//!   detected at runtime by probing kernel32 for `CreatePseudoConsole`.
//! - **winpty**: the out-of-band winpty agent, loaded from `winpty.dll`, for
//!   hosts that predate the pseudo-console.
//!
//! Backends are cargo features (`conpty` is on by default). With both
//! enabled, [`Pty::new`] prefers ConPTY and falls back to winpty when the
//! host lacks it; [`Pty::with_backend`] pins one explicitly.
//!
//! ```text
//! let mut pty = Pty::new(&PtyArgs::new(120, 40))?;
//! pty.spawn("C:\\Windows\\System32\\cmd.exe".into(), None, None, None)?;
//! pty.write(b"echo hello\r\n")?;
//! let output = pty.read(4096, true)?;
//! ```
//!
//! Whatever the backend, the session speaks raw bytes: the child's output
//! arrives as the VT/UTF-8 stream the console host produced, and writes go
//! to the child's input verbatim.

mod args;
mod error;

#[cfg(windows)]
mod conpty;
#[cfg(windows)]
mod handle;
#[cfg(windows)]
mod process;
#[cfg(windows)]
mod session;
#[cfg(windows)]
mod stream;
#[cfg(windows)]
mod wide;
#[cfg(windows)]
mod winpty;

pub use args::{AgentConfig, MouseMode, PtyArgs, PtyBackend};
pub use error::{PtyError, Result};

#[cfg(windows)]
pub use session::{conpty_available, Pty};
