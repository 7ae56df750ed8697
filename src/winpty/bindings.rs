//! C bindings for winpty.dll.
//!
//! Mirrors the subset of winpty.h this crate drives: error objects, agent
//! configuration, agent startup, I/O pipe names, process spawning and
//! resizing. Every error object returned by the library must be freed with
//! [`winpty_error_free`].

#![allow(non_camel_case_types)]

use windows::Win32::Foundation::{BOOL, HANDLE};

#[repr(C)]
pub struct winpty_error_s {
    _unused: [u8; 0],
}

/// An error object.
pub type winpty_error_t = winpty_error_s;
pub type winpty_error_ptr_t = *mut winpty_error_t;

#[repr(C)]
pub struct winpty_config_s {
    _unused: [u8; 0],
}

/// Agent configuration object (not thread-safe).
pub type winpty_config_t = winpty_config_s;

#[repr(C)]
pub struct winpty_s {
    _unused: [u8; 0],
}

/// Agent object (thread-safe).
pub type winpty_t = winpty_s;

#[repr(C)]
pub struct winpty_spawn_config_s {
    _unused: [u8; 0],
}

/// Spawn configuration object (not thread-safe).
pub type winpty_spawn_config_t = winpty_spawn_config_s;

/// The agent should shut down when the spawned process exits.
pub const WINPTY_SPAWN_FLAG_AUTO_SHUTDOWN: u64 = 0x1;
/// The agent process exits as soon as its shutdown finishes.
pub const WINPTY_SPAWN_FLAG_EXIT_AFTER_SHUTDOWN: u64 = 0x2;

#[link(name = "winpty")]
extern "C" {
    /// Gets the error code from the error object.
    pub fn winpty_error_code(err: winpty_error_ptr_t) -> u32;

    /// Returns a textual representation of the error. The string is freed
    /// when the error object is freed.
    pub fn winpty_error_msg(err: winpty_error_ptr_t) -> *const u16;

    /// Free the error object.
    pub fn winpty_error_free(err: winpty_error_ptr_t);

    /// Allocate an agent configuration carrying zero or more WINPTY_FLAG_xxx
    /// values. Returns NULL on error.
    pub fn winpty_config_new(agent_flags: u64, err: *mut winpty_error_ptr_t)
        -> *mut winpty_config_t;

    /// Free the configuration after passing it to `winpty_open`.
    pub fn winpty_config_free(cfg: *mut winpty_config_t);

    pub fn winpty_config_set_initial_size(cfg: *mut winpty_config_t, cols: i32, rows: i32);

    pub fn winpty_config_set_mouse_mode(cfg: *mut winpty_config_t, mouse_mode: i32);

    /// Time to wait for the agent to start and to answer any RPC request.
    /// Must be greater than zero.
    pub fn winpty_config_set_agent_timeout(cfg: *mut winpty_config_t, timeout_ms: u32);

    /// Starts the agent. Returns NULL on error. The client connects to the
    /// agent over a control pipe; the agent opens the data pipes.
    pub fn winpty_open(cfg: *const winpty_config_t, err: *mut winpty_error_ptr_t)
        -> *mut winpty_t;

    /// Names of the half-duplex named pipes used for terminal I/O. The
    /// strings are freed together with the `winpty_t` object.
    /// `winpty_conerr_name` returns NULL unless the CONERR flag was set.
    pub fn winpty_conin_name(wp: *mut winpty_t) -> *const u16;
    pub fn winpty_conout_name(wp: *mut winpty_t) -> *const u16;
    pub fn winpty_conerr_name(wp: *mut winpty_t) -> *const u16;

    /// Build a spawn configuration. The strings are copied; `env` is an
    /// environment block as passed to CreateProcess. Returns NULL on error.
    pub fn winpty_spawn_config_new(
        spawn_flags: u64,
        appname: *const u16,
        cmdline: *const u16,
        cwd: *const u16,
        env: *const u16,
        err: *mut winpty_error_ptr_t,
    ) -> *mut winpty_spawn_config_t;

    /// Free the spawn configuration after passing it to `winpty_spawn`.
    pub fn winpty_spawn_config_free(cfg: *mut winpty_spawn_config_t);

    /// Spawns the process. On success the returned process (and thread)
    /// handles are duplicated from the agent and owned by the caller. Can be
    /// called at most once per `winpty_t` object.
    pub fn winpty_spawn(
        wp: *mut winpty_t,
        cfg: *const winpty_spawn_config_t,
        process_handle: *mut HANDLE,
        thread_handle: *mut HANDLE,
        create_process_error: *mut u32,
        err: *mut winpty_error_ptr_t,
    ) -> BOOL;

    /// Change the size of the agent's console window.
    pub fn winpty_set_size(
        wp: *mut winpty_t,
        cols: i32,
        rows: i32,
        err: *mut winpty_error_ptr_t,
    ) -> BOOL;

    /// Frees the `winpty_t` object and its OS resources. Breaking the agent
    /// connection closes the agent console, terminating attached processes.
    pub fn winpty_free(wp: *mut winpty_t);
}
