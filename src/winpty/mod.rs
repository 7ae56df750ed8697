//! winpty backend.
//!
//! Fallback for hosts that predate the pseudo-console API. The winpty library
//! runs an out-of-process agent and publishes named pipes for terminal I/O;
//! this module drives it over FFI. Compiled in only with the `winpty` feature
//! since it links against winpty.dll.

#[cfg(feature = "winpty")]
mod bindings;

#[cfg(feature = "winpty")]
mod pty_impl;

#[cfg(feature = "winpty")]
pub use pty_impl::WinPtySession;

#[cfg(not(feature = "winpty"))]
mod default_impl;

#[cfg(not(feature = "winpty"))]
pub use default_impl::WinPtySession;
