//! Per-connection mode transition state
//!
//! One `ModeState` lives alongside each decorated connection. Every mutation
//! runs inside a single exclusive critical section covering the flags, the
//! counters, and the transition timestamp, so concurrent readers and writers
//! (one task reading, one writing, one flipping debug) never observe a torn
//! combination of flags.

use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use super::Mode;

/// Boolean transition flags of a connection.
///
/// A tagged variant instead of a field name string: an invalid flag is a
/// compile error, not a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Connection satisfied the criteria for full direct passthrough
    DirectReady,
    /// An anomaly forced reversion to strict monitoring
    OriginFallback,
    /// Reads are no longer inspected
    ReadBypass,
    /// Writes are no longer inspected
    WriteBypass,
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Flag::DirectReady => "DirectReady",
            Flag::OriginFallback => "OriginFallback",
            Flag::ReadBypass => "ReadBypass",
            Flag::WriteBypass => "WriteBypass",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct Inner {
    mode: Mode,
    initialized: bool,
    direct_ready: bool,
    origin_fallback: bool,
    read_bypass: bool,
    write_bypass: bool,
    data_total: usize,
    data_count: usize,
    first_packet: bool,
    expect_len: usize,
    match_count: usize,
    fallback_count: usize,
    debug: bool,
    last_transition: Option<Instant>,
}

/// Mutable direct/origin state for one connection.
///
/// Created alongside the connection it describes and dropped with it; there
/// is no independent persistence. No operation here returns an error.
pub struct ModeState {
    inner: Mutex<Inner>,
}

/// Consistent point-in-time copy of a [`ModeState`], for diagnostics only.
///
/// Never consulted for control decisions by other components.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub mode: Mode,
    pub initialized: bool,
    pub direct_ready: bool,
    pub origin_fallback: bool,
    pub read_bypass: bool,
    pub write_bypass: bool,
    pub data_total: usize,
    pub data_count: usize,
    pub first_packet: bool,
    pub expect_len: usize,
    pub match_count: usize,
    pub fallback_count: usize,
    pub debug: bool,
    pub last_transition: Option<Instant>,
}

impl ModeState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                mode: Mode::Origin,
                initialized: false,
                direct_ready: false,
                origin_fallback: false,
                read_bypass: false,
                write_bypass: false,
                data_total: 0,
                data_count: 0,
                first_packet: true,
                expect_len: 0,
                match_count: 0,
                fallback_count: 0,
                debug: false,
                last_transition: None,
            }),
        }
    }

    /// Record the negotiated mode and seed the scan window.
    ///
    /// `window` is the number of outbound bytes inspected before the
    /// connection is trusted for full passthrough.
    pub fn initialize(&self, mode: Mode, window: usize) {
        let mut s = self.inner.lock();
        s.mode = mode;
        s.data_total = window;
        s.initialized = true;
        s.last_transition = Some(Instant::now());
        if s.debug {
            debug!(mode = %mode, window, "mode state initialized");
        }
    }

    /// Set a single transition flag.
    ///
    /// Setting `OriginFallback` true forces both bypass flags back to false
    /// and bumps the fallback counter: a connection that fell back must not
    /// keep skipping inspection in either direction.
    pub fn transition(&self, flag: Flag, value: bool) {
        let mut s = self.inner.lock();
        s.last_transition = Some(Instant::now());
        match flag {
            Flag::DirectReady => s.direct_ready = value,
            Flag::OriginFallback => {
                s.origin_fallback = value;
                if value {
                    s.read_bypass = false;
                    s.write_bypass = false;
                    s.fallback_count += 1;
                }
            }
            Flag::ReadBypass => s.read_bypass = value,
            Flag::WriteBypass => s.write_bypass = value,
        }
        if s.debug {
            debug!(flag = %flag, value, "mode state transition");
        }
    }

    /// Enter full direct passthrough: ready plus both bypass directions,
    /// set together in one critical section.
    pub fn enter_bypass(&self) {
        let mut s = self.inner.lock();
        s.direct_ready = true;
        s.read_bypass = true;
        s.write_bypass = true;
        s.last_transition = Some(Instant::now());
        if s.debug {
            debug!(data_count = s.data_count, "entering full direct bypass");
        }
    }

    pub fn set_mode(&self, mode: Mode) {
        let mut s = self.inner.lock();
        s.mode = mode;
        s.last_transition = Some(Instant::now());
        if s.debug {
            debug!(mode = %mode, "mode changed");
        }
    }

    pub fn mode(&self) -> Mode {
        self.inner.lock().mode
    }

    pub fn set_debug(&self, enable: bool) {
        let mut s = self.inner.lock();
        s.debug = enable;
        s.last_transition = Some(Instant::now());
    }

    pub fn debug_enabled(&self) -> bool {
        self.inner.lock().debug
    }

    /// Count `n` outbound bytes against the scan window.
    ///
    /// Clears `first_packet` and reports whether the window is now complete
    /// (enough data has passed to trust the direct transition).
    pub fn record_outbound(&self, n: usize) -> bool {
        let mut s = self.inner.lock();
        s.data_count += n;
        s.first_packet = false;
        s.last_transition = Some(Instant::now());
        s.data_total > 0 && s.data_count >= s.data_total
    }

    /// Account for stripped trailing records: `bytes` removed from the wire,
    /// `records` signature matches confirmed.
    pub fn note_stripped(&self, bytes: usize, records: usize) {
        let mut s = self.inner.lock();
        s.expect_len += bytes;
        s.match_count += records;
        s.last_transition = Some(Instant::now());
    }

    /// Whether the write path should still inspect outbound buffers.
    pub fn should_scan_writes(&self) -> bool {
        let s = self.inner.lock();
        s.mode.is_direct() && !s.write_bypass && !s.origin_fallback
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().initialized
    }

    pub fn direct_ready(&self) -> bool {
        self.inner.lock().direct_ready
    }

    pub fn origin_fallback(&self) -> bool {
        self.inner.lock().origin_fallback
    }

    pub fn read_bypass(&self) -> bool {
        self.inner.lock().read_bypass
    }

    pub fn write_bypass(&self) -> bool {
        self.inner.lock().write_bypass
    }

    /// Fully in direct bypass: both directions uninspected.
    pub fn bypassed(&self) -> bool {
        let s = self.inner.lock();
        s.read_bypass && s.write_bypass
    }

    pub fn first_packet(&self) -> bool {
        self.inner.lock().first_packet
    }

    pub fn fallback_count(&self) -> usize {
        self.inner.lock().fallback_count
    }

    /// Consistent copy of all fields.
    pub fn snapshot(&self) -> StateSnapshot {
        let s = self.inner.lock();
        StateSnapshot {
            mode: s.mode,
            initialized: s.initialized,
            direct_ready: s.direct_ready,
            origin_fallback: s.origin_fallback,
            read_bypass: s.read_bypass,
            write_bypass: s.write_bypass,
            data_total: s.data_total,
            data_count: s.data_count,
            first_packet: s.first_packet,
            expect_len: s.expect_len,
            match_count: s.match_count,
            fallback_count: s.fallback_count,
            debug: s.debug,
            last_transition: s.last_transition,
        }
    }

    /// Emit the current state as a diagnostic event and return it.
    pub fn dump(&self) -> StateSnapshot {
        let snapshot = self.snapshot();
        debug!(state = ?snapshot, "mode state dump");
        snapshot
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_state_is_zeroed() {
        let state = ModeState::new();
        let snap = state.snapshot();
        assert!(!snap.initialized);
        assert!(!snap.direct_ready);
        assert!(!snap.read_bypass);
        assert!(!snap.write_bypass);
        assert!(snap.first_packet);
        assert_eq!(snap.fallback_count, 0);
        assert!(snap.last_transition.is_none());
    }

    #[test]
    fn test_transitions_set_flags_and_timestamp() {
        let state = ModeState::new();
        state.transition(Flag::DirectReady, true);
        assert!(state.direct_ready());
        state.transition(Flag::ReadBypass, true);
        state.transition(Flag::WriteBypass, true);
        assert!(state.bypassed());
        state.transition(Flag::ReadBypass, false);
        assert!(!state.bypassed());
        assert!(state.snapshot().last_transition.is_some());
    }

    #[test]
    fn test_fallback_clears_bypass_and_counts() {
        let state = ModeState::new();
        state.enter_bypass();
        assert!(state.bypassed());

        state.transition(Flag::OriginFallback, true);
        let snap = state.snapshot();
        assert!(snap.origin_fallback);
        assert!(!snap.read_bypass);
        assert!(!snap.write_bypass);
        assert_eq!(snap.fallback_count, 1);

        // Clearing the fallback does not touch the counter
        state.transition(Flag::OriginFallback, false);
        state.transition(Flag::OriginFallback, true);
        assert_eq!(state.fallback_count(), 2);
    }

    #[test]
    fn test_scan_window_accounting() {
        let state = ModeState::new();
        state.initialize(Mode::Direct, 100);
        assert!(state.should_scan_writes());
        assert!(state.first_packet());

        assert!(!state.record_outbound(60));
        assert!(!state.first_packet());
        assert!(state.record_outbound(40));

        state.enter_bypass();
        assert!(!state.should_scan_writes());
        assert!(state.direct_ready());
    }

    #[test]
    fn test_origin_mode_never_scans() {
        let state = ModeState::new();
        state.initialize(Mode::Origin, 100);
        assert!(!state.should_scan_writes());
        state.set_mode(Mode::Direct);
        assert!(state.should_scan_writes());
    }

    #[test]
    fn test_note_stripped_accumulates() {
        let state = ModeState::new();
        state.note_stripped(7, 1);
        state.note_stripped(14, 2);
        let snap = state.snapshot();
        assert_eq!(snap.expect_len, 21);
        assert_eq!(snap.match_count, 3);
    }

    #[test]
    fn test_concurrent_transitions_are_atomic() {
        // N threads each set a distinct flag; all must land with no lost
        // updates and the timestamp must reflect the last applied one.
        let state = Arc::new(ModeState::new());
        let start = Instant::now();
        let flags = [
            Flag::DirectReady,
            Flag::ReadBypass,
            Flag::WriteBypass,
        ];

        let handles: Vec<_> = flags
            .iter()
            .map(|&flag| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        state.transition(flag, true);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = state.snapshot();
        assert!(snap.direct_ready);
        assert!(snap.read_bypass);
        assert!(snap.write_bypass);
        assert!(snap.last_transition.unwrap() >= start);
    }

    #[test]
    fn test_dump_emits_without_panic() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();

        let state = ModeState::new();
        state.set_debug(true);
        state.transition(Flag::DirectReady, true);
        let snap = state.dump();
        assert!(snap.direct_ready);
        assert!(snap.debug);
    }
}
