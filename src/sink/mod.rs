//! Outbound message sinks.
//!
//! # Data Flow
//! ```text
//! ingress handler
//!     → MessageSink::send (awaited, one message per request)
//!     → channel.rs (bounded mpsc with send timeout)
//!     → json_lines.rs (drain task writing JSON lines)
//! ```
//!
//! # Design Decisions
//! - The handler awaits the hand-off; a full channel is backpressure
//! - A hand-off that cannot complete in time is a failure, not a retry
//! - The sink owns delivery and ordering guarantees beyond the hand-off

pub mod channel;
pub mod json_lines;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

pub use channel::ChannelSink;
pub use json_lines::drain_json_lines;

/// Errors returned when a message cannot be handed off.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("outbound channel is closed")]
    Closed,

    #[error("outbound channel did not accept the message within {0:?}")]
    Timeout(Duration),
}

/// Destination for messages produced by the ingress handler.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Hand off one message. Returns once the sink has taken ownership.
    async fn send(&self, message: Message) -> Result<(), SinkError>;
}
