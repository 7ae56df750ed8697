//! ConPTY backend.
//!
//! Wraps the Windows pseudo-console API (`CreatePseudoConsole`), available
//! from Windows 10 build 1809. When the `conpty` feature is disabled a
//! placeholder implementation that refuses every operation is compiled
//! instead.

#[cfg(feature = "conpty")]
mod pty_impl;

#[cfg(feature = "conpty")]
pub use pty_impl::ConPtySession;

#[cfg(not(feature = "conpty"))]
mod default_impl;

#[cfg(not(feature = "conpty"))]
pub use default_impl::ConPtySession;
