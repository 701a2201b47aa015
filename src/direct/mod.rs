//! Direct-mode data path
//!
//! Responsibilities:
//! - DirectStream: decorator over an established secure stream that
//!   suppresses trailing alert records on the way out
//! - DirectController: owner handle for flipping mode/debug mid-flight
//! - write_direct / copy_direct / relay: one-shot and streaming variants of
//!   the same suppression
//!
//! This layer performs no handshake and no record decryption; it only
//! rewrites the tail of outbound buffers before they reach the transport.

mod relay;
mod stream;

pub use relay::{copy_direct, relay};
pub use stream::{DirectController, DirectStream};

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::record::strip_trailing_alerts;

/// Write `data` with trailing alert records suppressed.
///
/// Only the stripped prefix reaches the writer, but the reported count is
/// the full original length: callers holding a standard "write returns n"
/// contract must not treat the suppressed tail as a short write and retry
/// it. Transport errors pass through unchanged.
pub async fn write_direct<W>(writer: &mut W, data: &[u8]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let (safe, removed) = strip_trailing_alerts(data);
    if removed > 0 {
        debug!(removed, suppressed = data.len() - safe.len(), "suppressed trailing alert records");
    }
    if !safe.is_empty() {
        writer.write_all(safe).await?;
    }
    Ok(data.len())
}
