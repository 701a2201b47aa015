//! Suppressing copy loops for tunnel plumbing
//!
//! `copy_direct` moves one direction of a tunnel while stripping trailing
//! alert records from every chunk; `relay` runs both directions to
//! completion. Both operate on already-established streams.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::common::Stream;
use crate::record::strip_trailing_alerts;

/// Buffer size for relay operations (32KB)
const RELAY_BUFFER_SIZE: usize = 32 * 1024;

/// Copy from `reader` to `writer`, suppressing trailing alert records in
/// each chunk.
///
/// Returns `(bytes written, alert records stripped)`. Read and write errors
/// from the underlying transport propagate unchanged; a clean EOF ends the
/// copy normally.
pub async fn copy_direct<R, W>(reader: &mut R, writer: &mut W) -> io::Result<(u64, u64)>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0u64;
    let mut stripped = 0u64;
    let mut buf = BytesMut::with_capacity(RELAY_BUFFER_SIZE);
    buf.resize(RELAY_BUFFER_SIZE, 0);

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        let (safe, removed) = strip_trailing_alerts(&buf[..n]);
        if removed > 0 {
            trace!(removed, "suppressed trailing alert records in relay");
            stripped += removed as u64;
        }
        if safe.is_empty() {
            continue;
        }

        writer.write_all(safe).await?;
        writer.flush().await?;
        written += safe.len() as u64;
    }

    Ok((written, stripped))
}

/// Relay data between two streams with suppression on both directions.
///
/// Best-effort teardown helper: either side failing ends its direction and
/// shuts the peer's write half down. Returns `(a_to_b, b_to_a)` byte totals.
pub async fn relay(a: Stream, b: Stream) -> (u64, u64) {
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);

    let forward = async {
        let total = copy_direct(&mut a_read, &mut b_write)
            .await
            .map(|(n, _)| n)
            .unwrap_or(0);
        let _ = b_write.shutdown().await;
        total
    };

    let backward = async {
        let total = copy_direct(&mut b_read, &mut a_write)
            .await
            .map(|(n, _)| n)
            .unwrap_or(0);
        let _ = a_write.shutdown().await;
        total
    };

    tokio::join!(forward, backward)
}
