//! Operating mode and the per-connection capability surface
//!
//! Responsibilities:
//! - Mode: which data-flow discipline a connection runs under
//! - ModeExtension: capability trait a connection owner supplies to have
//!   mode and diagnostics applied
//! - ModeState: transition bookkeeping (see `state`)
//!
//! This layer never touches the wire. It is advisory state on top of a
//! working connection and must never be the reason one fails: unknown mode
//! strings fall back to the strict default, and connections without the
//! capability are left untouched.

mod state;

pub use state::{Flag, ModeState, StateSnapshot};

use std::fmt;
use std::sync::Arc;

/// Data-flow discipline for a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Full per-record monitoring with fallback (strict default)
    #[default]
    Origin,
    /// Passthrough with trailing-alert suppression, minimal inspection
    Direct,
}

impl Mode {
    /// Parse a mode name, case-insensitively.
    ///
    /// Anything unrecognized (including the empty string) is `Origin`:
    /// ambiguous input must never silently enable the lower-inspection mode.
    pub fn parse(s: &str) -> Mode {
        if s.eq_ignore_ascii_case("direct") {
            Mode::Direct
        } else {
            Mode::Origin
        }
    }

    pub fn is_direct(self) -> bool {
        self == Mode::Direct
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Origin => write!(f, "Origin"),
            Mode::Direct => write!(f, "Direct"),
        }
    }
}

/// Capability set a connection exposes to have direct-mode state managed.
///
/// The owner of the connection supplies this explicitly (typically via
/// [`DirectController`](crate::direct::DirectController)); there is no
/// runtime probing of arbitrary connection types.
pub trait ModeExtension {
    /// Switch the operating mode. May be called at any time by the owner.
    fn set_mode(&self, mode: Mode);

    /// Current operating mode.
    fn mode(&self) -> Mode;

    /// Toggle diagnostic emission for state transitions.
    fn enable_debug(&self, enable: bool);

    /// Shared transition state for this connection.
    fn state(&self) -> Arc<ModeState>;
}

/// Apply a mode and debug setting through a connection's capability.
///
/// A connection without the capability (`None`) is simply left unmodified.
/// Not an error: plain TLS peers keep working and are never touched.
pub fn enable_mode(conn: Option<&dyn ModeExtension>, mode: Mode, debug: bool) {
    let Some(conn) = conn else { return };
    conn.set_mode(mode);
    conn.enable_debug(debug);
}
