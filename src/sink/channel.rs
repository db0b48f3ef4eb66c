//! In-process outbound channel.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

use crate::config::SinkConfig;
use crate::message::Message;
use crate::sink::{MessageSink, SinkError};

/// A bounded channel sink. The receiving half is consumed by whatever
/// publishes messages onward.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Message>,
    send_timeout: Duration,
}

impl ChannelSink {
    /// Create a sink and the receiver for its messages.
    pub fn new(capacity: usize, send_timeout: Duration) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, send_timeout }, rx)
    }

    pub fn from_config(config: &SinkConfig) -> (Self, mpsc::Receiver<Message>) {
        Self::new(config.capacity, Duration::from_millis(config.send_timeout_ms))
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send(&self, message: Message) -> Result<(), SinkError> {
        self.tx
            .send_timeout(message, self.send_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => SinkError::Timeout(self.send_timeout),
                SendTimeoutError::Closed(_) => SinkError::Closed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Payload;
    use std::collections::BTreeMap;

    fn message(text: &str) -> Message {
        Message::new(Payload::Text(text.into()), BTreeMap::new())
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let (sink, mut rx) = ChannelSink::new(4, Duration::from_millis(100));
        sink.send(message("a")).await.unwrap();
        sink.send(message("b")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().payload().as_text(), Some("a"));
        assert_eq!(rx.recv().await.unwrap().payload().as_text(), Some("b"));
    }

    #[tokio::test]
    async fn test_full_channel_times_out() {
        let (sink, _rx) = ChannelSink::new(1, Duration::from_millis(20));
        sink.send(message("a")).await.unwrap();

        let err = sink.send(message("b")).await.unwrap_err();
        assert_eq!(err, SinkError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (sink, rx) = ChannelSink::new(1, Duration::from_millis(20));
        drop(rx);

        assert_eq!(sink.send(message("a")).await.unwrap_err(), SinkError::Closed);
    }
}
