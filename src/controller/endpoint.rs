//! The request surface the browser navigator and tools are written against.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_RESPONSE_TIMEOUT;
use crate::error::Result;
use crate::protocol::{AddressPattern, Message};

use super::status::ControllerStatus;

// ============================================================================
// OscEndpoint
// ============================================================================

/// Something that can send OSC messages and correlate replies.
///
/// [`Controller`](super::Controller) is the production implementation;
/// tests substitute an in-memory DAW.
#[async_trait]
pub trait OscEndpoint: Send + Sync {
    /// Sends without waiting for anything.
    async fn fire_and_forget(&self, message: Message) -> Result<()>;

    /// Sends and waits for the first inbound message matching `expect`.
    async fn send_and_wait(
        &self,
        message: Message,
        expect: AddressPattern,
        timeout: Duration,
    ) -> Result<Message>;

    /// Returns the latest cached message for `address`.
    fn get_cached(&self, address: &str) -> Option<Message>;

    /// Default reply deadline.
    fn default_timeout(&self) -> Duration {
        DEFAULT_RESPONSE_TIMEOUT
    }

    /// Connection health, if the endpoint tracks it.
    fn status(&self) -> Option<ControllerStatus> {
        None
    }
}

#[async_trait]
impl<T: OscEndpoint + ?Sized> OscEndpoint for Arc<T> {
    async fn fire_and_forget(&self, message: Message) -> Result<()> {
        (**self).fire_and_forget(message).await
    }

    async fn send_and_wait(
        &self,
        message: Message,
        expect: AddressPattern,
        timeout: Duration,
    ) -> Result<Message> {
        (**self).send_and_wait(message, expect, timeout).await
    }

    fn get_cached(&self, address: &str) -> Option<Message> {
        (**self).get_cached(address)
    }

    fn default_timeout(&self) -> Duration {
        (**self).default_timeout()
    }

    fn status(&self) -> Option<ControllerStatus> {
        (**self).status()
    }
}
