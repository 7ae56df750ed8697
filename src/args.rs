//! Session creation arguments.
//!
//! [`PtyArgs`] carries the geometry shared by both backends plus the knobs
//! that only the winpty agent understands (mouse mode, RPC timeout, agent
//! flags). The ConPTY backend ignores the winpty-specific fields.

use bitflags::bitflags;

use crate::error::{PtyError, Result};

/// Backend used to create a pseudo-terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtyBackend {
    /// Native Windows pseudo-console API, available from Windows 10 build 1809.
    ConPty,
    /// The winpty library, useful on older Windows systems.
    WinPty,
    /// Probe the host and pick whichever backend is available.
    Auto,
}

/// Mouse capture settings for the winpty agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum MouseMode {
    /// QuickEdit mode starts disabled and the agent never sends mouse mode
    /// sequences to the terminal.
    #[default]
    None = 0,
    /// The agent enables or disables terminal mouse input as the console
    /// enters or leaves mouse input mode.
    Auto = 1,
    /// The agent force-enables the terminal's mouse input mode.
    Force = 2,
}

bitflags! {
    /// General configuration flags for the winpty agent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AgentConfig: u64 {
        /// Create a separate screen buffer connected to a conerr pipe and
        /// hand it to child processes as their stderr.
        const CONERR = 0x1;
        /// Suppress escape sequences in the agent output.
        const PLAIN_OUTPUT = 0x2;
        /// Re-enable color escape sequences when PLAIN_OUTPUT is set.
        const COLOR_ESCAPES = 0x4;
    }
}

/// Arguments used to create a pseudo-terminal session.
#[derive(Debug, Clone)]
pub struct PtyArgs {
    /// Number of character columns to display.
    pub cols: i32,
    /// Number of line rows to display.
    pub rows: i32,
    /// Mouse capture setting (winpty only).
    pub mouse_mode: MouseMode,
    /// Time in milliseconds to wait for the agent to start and to answer any
    /// RPC request (winpty only).
    pub timeout: u32,
    /// Agent configuration flags (winpty only).
    pub agent_config: AgentConfig,
}

impl PtyArgs {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            ..Default::default()
        }
    }

    /// Reject non-positive geometry before any OS resource is touched.
    pub fn check_size(&self) -> Result<()> {
        check_size(self.cols, self.rows)
    }
}

impl Default for PtyArgs {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 25,
            mouse_mode: MouseMode::None,
            timeout: 30_000,
            agent_config: AgentConfig::COLOR_ESCAPES,
        }
    }
}

/// Shared geometry validation used by every resize and construction path.
pub(crate) fn check_size(cols: i32, rows: i32) -> Result<()> {
    if cols <= 0 || rows <= 0 {
        return Err(PtyError::InvalidSize { cols, rows });
    }
    Ok(())
}
