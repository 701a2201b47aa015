//! Session Layer
//!
//! Responsibilities:
//! - Wrap an established stream with a data-flow discipline
//!
//! This layer does NOT perform handshakes, parse proxy protocols, or make
//! routing decisions. The stream handed in is already secured by the
//! underlying transport-security provider.

mod direct;
mod plain;

pub use direct::DirectSession;
pub use plain::PlainSession;

use async_trait::async_trait;

use crate::common::{Result, Stream};
use crate::config::DirectConfig;

/// Session trait for wrapping streams
///
/// Each implementation wraps a stream and returns a new stream with its
/// discipline applied.
#[async_trait]
pub trait Session: Send + Sync {
    /// Wrap a stream (client side)
    async fn wrap_client(&self, stream: Stream) -> Result<Stream>;

    /// Wrap a stream (server side)
    async fn wrap_server(&self, stream: Stream) -> Result<Stream>;
}

/// Session configuration
#[derive(Debug, Clone, Default)]
pub enum SessionConfig {
    /// No session layer (plain passthrough)
    #[default]
    Plain,
    /// Direct passthrough with alert suppression
    Direct(DirectConfig),
}

/// Create a session from configuration
pub fn create_session(config: &SessionConfig) -> Box<dyn Session> {
    match config {
        SessionConfig::Plain => Box::new(PlainSession),
        SessionConfig::Direct(direct_config) => {
            Box::new(DirectSession::new(direct_config.clone()))
        }
    }
}
