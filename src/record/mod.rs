//! Alert record scanning
//!
//! Pure functions for locating and removing synthetic TLS alert records from
//! the tail of an outbound buffer. A passthrough connection that still emits
//! a close-notify (or any other alert) after its handshake is trivially
//! fingerprintable, so the direct write path asks this module for a safe
//! prefix before touching the wire.
//!
//! No I/O, no shared state: every function here may be called concurrently
//! on independent buffers.

/// TLS record type byte for alert records
pub const ALERT_RECORD_TYPE: u8 = 0x15;

/// Protocol version bytes (TLS 1.2) in the record header
pub const ALERT_RECORD_VERSION: [u8; 2] = [0x03, 0x03];

/// Length of a TLS record header (type + version + length)
pub const RECORD_HEADER_LEN: usize = 5;

/// Largest alert payload treated as strippable.
///
/// Genuine application data can coincidentally begin with the 3-byte alert
/// prefix; a declared length above this bound is assumed to be payload and
/// left alone.
pub const MAX_ALERT_PAYLOAD: usize = 256;

/// The standard close_notify alert record (type 21, TLS 1.2, 2-byte payload)
pub const CLOSE_NOTIFY: [u8; 7] = [0x15, 0x03, 0x03, 0x00, 0x02, 0x01, 0x00];

/// Check whether `data` starts with a TLS alert record header.
///
/// Requires at least a full record header to be present; shorter slices are
/// never a match.
pub fn is_alert_record(data: &[u8]) -> bool {
    data.len() >= RECORD_HEADER_LEN
        && data[0] == ALERT_RECORD_TYPE
        && data[1..3] == ALERT_RECORD_VERSION
}

/// Locate a trailing alert record in `data`.
///
/// Scans backward from the end for a position whose header matches the alert
/// signature and whose declared big-endian length lands exactly on the end
/// of the buffer. The declared length must be in `(0, MAX_ALERT_PAYLOAD]`.
/// Returns `(offset, total record length)` of the match, or `None`.
pub fn find_trailing_alert(data: &[u8]) -> Option<(usize, usize)> {
    if data.len() < RECORD_HEADER_LEN {
        return None;
    }
    for i in (0..=data.len() - RECORD_HEADER_LEN).rev() {
        if is_alert_record(&data[i..]) {
            let length = u16::from_be_bytes([data[i + 3], data[i + 4]]) as usize;
            if length > 0
                && length <= MAX_ALERT_PAYLOAD
                && i + RECORD_HEADER_LEN + length == data.len()
            {
                return Some((i, RECORD_HEADER_LEN + length));
            }
        }
    }
    None
}

/// Strip every trailing alert record from `data`.
///
/// Alert records can stack (close_notify after user_canceled, for example),
/// so stripping repeats until the new tail no longer matches. Returns the
/// remaining prefix and the number of records removed. Terminates because
/// every match removes at least `RECORD_HEADER_LEN + 1` bytes; the
/// zero-length malformed case is excluded by `find_trailing_alert`.
pub fn strip_trailing_alerts(data: &[u8]) -> (&[u8], usize) {
    let mut data = data;
    let mut removed = 0;
    while let Some((idx, len)) = find_trailing_alert(data) {
        debug_assert_eq!(idx + len, data.len());
        data = &data[..idx];
        removed += 1;
    }
    (data, removed)
}
