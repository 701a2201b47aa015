//! Direct session - installs the alert-suppressing decorator

use async_trait::async_trait;

use crate::common::{Result, Stream};
use crate::config::DirectConfig;
use crate::direct::DirectStream;

use super::Session;

/// Session that wraps streams in the direct-mode decorator.
///
/// Both sides get the same treatment: the suppression applies to whichever
/// peer writes the outbound tail. Callers that need the controller should
/// build a [`DirectStream`] directly instead of going through the session
/// factory.
pub struct DirectSession {
    config: DirectConfig,
}

impl DirectSession {
    pub fn new(config: DirectConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Session for DirectSession {
    async fn wrap_client(&self, stream: Stream) -> Result<Stream> {
        Ok(Box::new(DirectStream::new(stream, &self.config)))
    }

    async fn wrap_server(&self, stream: Stream) -> Result<Stream> {
        Ok(Box::new(DirectStream::new(stream, &self.config)))
    }
}
