//! Direct-mode stream decorator

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

use crate::common::Stream;
use crate::config::DirectConfig;
use crate::mode::{Flag, Mode, ModeExtension, ModeState};
use crate::record::strip_trailing_alerts;

/// Decorator over an established secure stream.
///
/// Reads are passthrough. Writes in Direct mode are scanned for trailing
/// alert records until the connection earns full bypass; the suppressed tail
/// is reported as written so upstream writers never see a short write for
/// it. In Origin mode (or after a fallback) every byte passes untouched.
pub struct DirectStream {
    inner: Stream,
    state: Arc<ModeState>,
}

impl DirectStream {
    /// Wrap `inner` using `config` for the initial mode, debug flag, and
    /// scan window.
    pub fn new(inner: Stream, config: &DirectConfig) -> Self {
        let state = Arc::new(ModeState::new());
        state.set_debug(config.debug);
        state.initialize(config.mode(), config.scan_window);
        Self { inner, state }
    }

    /// Wrap `inner` sharing an externally created state.
    pub fn with_state(inner: Stream, state: Arc<ModeState>) -> Self {
        Self { inner, state }
    }

    /// Owner handle for this connection's mode state.
    ///
    /// The handle stays valid after the stream itself is boxed into an I/O
    /// pipeline, so mode and debug can be flipped at any time.
    pub fn controller(&self) -> DirectController {
        DirectController {
            state: Arc::clone(&self.state),
        }
    }

    pub fn state(&self) -> Arc<ModeState> {
        Arc::clone(&self.state)
    }
}

impl AsyncRead for DirectStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        // Inbound inspection belongs to the underlying provider; direct
        // reads are passthrough in every mode.
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for DirectStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        let this = self.get_mut();
        if !this.state.should_scan_writes() {
            return Pin::new(&mut this.inner).poll_write(cx, buf);
        }

        let (safe, removed) = strip_trailing_alerts(buf);
        if removed > 0 {
            this.state.note_stripped(buf.len() - safe.len(), removed);
            if this.state.debug_enabled() {
                debug!(removed, "suppressed trailing alert records on direct write");
            }
        }

        if safe.is_empty() && removed > 0 {
            if this.state.first_packet() {
                // Nothing but alert records before any application data:
                // anomalous for a passthrough peer. Revert to strict
                // handling and forward the bytes verbatim.
                this.state.transition(Flag::OriginFallback, true);
                return Pin::new(&mut this.inner).poll_write(cx, buf);
            }
            // Fully suppressed; the caller still sees a complete write.
            return Poll::Ready(Ok(buf.len()));
        }

        match Pin::new(&mut this.inner).poll_write(cx, safe) {
            Poll::Ready(Ok(n)) if n == safe.len() => {
                if this.state.record_outbound(n) {
                    this.state.enter_bypass();
                }
                Poll::Ready(Ok(buf.len()))
            }
            // Partial write: report the true count. The caller resubmits
            // the remainder, alert tail included, and it is re-scanned.
            Poll::Ready(Ok(n)) => {
                if this.state.record_outbound(n) {
                    this.state.enter_bypass();
                }
                Poll::Ready(Ok(n))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// Clonable owner handle implementing the mode capability for a
/// [`DirectStream`].
#[derive(Clone)]
pub struct DirectController {
    state: Arc<ModeState>,
}

impl ModeExtension for DirectController {
    fn set_mode(&self, mode: Mode) {
        self.state.set_mode(mode);
    }

    fn mode(&self) -> Mode {
        self.state.mode()
    }

    fn enable_debug(&self, enable: bool) {
        self.state.set_debug(enable);
    }

    fn state(&self) -> Arc<ModeState> {
        Arc::clone(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::enable_mode;
    use crate::record::CLOSE_NOTIFY;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn direct_config(scan_window: usize) -> DirectConfig {
        DirectConfig {
            mode: "direct".to_string(),
            debug: false,
            scan_window,
        }
    }

    fn tagged(payload: &[u8]) -> Vec<u8> {
        let mut buf = payload.to_vec();
        buf.extend_from_slice(&CLOSE_NOTIFY);
        buf
    }

    #[tokio::test]
    async fn test_direct_write_strips_and_reports_full_length() {
        let (near, mut far) = tokio::io::duplex(4096);
        let mut stream = DirectStream::new(Box::new(near), &direct_config(16 * 1024));

        let buf = tagged(b"hello world");
        let n = stream.write(&buf).await.unwrap();
        assert_eq!(n, buf.len());
        drop(stream);

        let mut received = Vec::new();
        far.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"hello world");
    }

    #[tokio::test]
    async fn test_origin_mode_forwards_alert_tail() {
        let (near, mut far) = tokio::io::duplex(4096);
        let config = DirectConfig::default(); // origin
        let mut stream = DirectStream::new(Box::new(near), &config);

        let buf = tagged(b"data");
        let n = stream.write(&buf).await.unwrap();
        assert_eq!(n, buf.len());
        drop(stream);

        let mut received = Vec::new();
        far.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, buf);
    }

    #[tokio::test]
    async fn test_reads_are_passthrough() {
        let (near, mut far) = tokio::io::duplex(4096);
        let mut stream = DirectStream::new(Box::new(near), &direct_config(16 * 1024));

        far.write_all(&tagged(b"inbound")).await.unwrap();
        drop(far);

        let mut received = Vec::new();
        stream.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, tagged(b"inbound"));
    }

    #[tokio::test]
    async fn test_scan_window_completion_enters_bypass() {
        let (near, mut far) = tokio::io::duplex(4096);
        let mut stream = DirectStream::new(Box::new(near), &direct_config(8));
        let state = stream.state();

        stream.write_all(b"12345678").await.unwrap();
        let snap = state.snapshot();
        assert!(snap.direct_ready);
        assert!(snap.read_bypass);
        assert!(snap.write_bypass);

        // Bypassed: alert tails now pass untouched
        let buf = tagged(b"later");
        stream.write_all(&buf).await.unwrap();
        drop(stream);

        let mut received = Vec::new();
        far.read_to_end(&mut received).await.unwrap();
        assert_eq!(&received[..8], b"12345678");
        assert_eq!(&received[8..], &buf[..]);
    }

    #[tokio::test]
    async fn test_alert_only_first_flight_falls_back() {
        let (near, mut far) = tokio::io::duplex(4096);
        let mut stream = DirectStream::new(Box::new(near), &direct_config(16 * 1024));
        let state = stream.state();

        let n = stream.write(&CLOSE_NOTIFY).await.unwrap();
        assert_eq!(n, CLOSE_NOTIFY.len());

        let snap = state.snapshot();
        assert!(snap.origin_fallback);
        assert!(!snap.read_bypass);
        assert!(!snap.write_bypass);
        assert_eq!(snap.fallback_count, 1);
        drop(stream);

        // Bytes were forwarded verbatim
        let mut received = Vec::new();
        far.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, CLOSE_NOTIFY);
    }

    #[tokio::test]
    async fn test_late_alert_only_buffer_is_suppressed() {
        let (near, mut far) = tokio::io::duplex(4096);
        let mut stream = DirectStream::new(Box::new(near), &direct_config(16 * 1024));

        stream.write_all(b"app data").await.unwrap();
        let n = stream.write(&CLOSE_NOTIFY).await.unwrap();
        assert_eq!(n, CLOSE_NOTIFY.len());
        drop(stream);

        let mut received = Vec::new();
        far.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"app data");
    }

    #[tokio::test]
    async fn test_controller_flips_mode_mid_flight() {
        let (near, mut far) = tokio::io::duplex(4096);
        let config = DirectConfig::default(); // origin
        let mut stream = DirectStream::new(Box::new(near), &config);
        let controller = stream.controller();
        assert_eq!(controller.mode(), Mode::Origin);

        enable_mode(Some(&controller), Mode::Direct, true);
        assert_eq!(controller.mode(), Mode::Direct);
        assert!(controller.state().debug_enabled());

        let buf = tagged(b"switched");
        stream.write_all(&buf).await.unwrap();
        drop(stream);

        let mut received = Vec::new();
        far.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"switched");
    }
}
