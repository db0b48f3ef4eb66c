//! Drains an outbound channel as JSON lines.
//!
//! Each message becomes one line:
//! `{"id":…,"timestamp":…,"headers":{…},"payload":"…"}` for text payloads,
//! with `payload_base64` in place of `payload` for binary ones.

use std::collections::BTreeMap;

use base64::Engine;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::message::{Message, Payload};

#[derive(Serialize)]
struct MessageRecord<'a> {
    id: Uuid,
    timestamp: u64,
    headers: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_base64: Option<String>,
}

impl<'a> From<&'a Message> for MessageRecord<'a> {
    fn from(message: &'a Message) -> Self {
        let (payload, payload_base64) = match message.payload() {
            Payload::Text(text) => (Some(text.as_str()), None),
            Payload::Binary(bytes) => (
                None,
                Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            ),
        };
        Self {
            id: message.id(),
            timestamp: message.timestamp(),
            headers: message.headers(),
            payload,
            payload_base64,
        }
    }
}

/// Render one message as a JSON line (including the trailing newline).
pub fn to_json_line(message: &Message) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(&MessageRecord::from(message))?;
    line.push('\n');
    Ok(line)
}

/// Write every received message to `writer` until all senders are dropped.
/// Returns the number of messages written.
pub async fn drain_json_lines<W>(
    mut rx: mpsc::Receiver<Message>,
    mut writer: W,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(message) = rx.recv().await {
        let line = to_json_line(&message)?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        written += 1;
        tracing::trace!(message_id = %message.id(), "Message published");
    }
    tracing::debug!(written, "Outbound channel drained");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_text_line() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain;charset=UTF-8".to_string());
        let message = Message::new(Payload::Text("hello".into()), headers);

        let line = to_json_line(&message).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["payload"], "hello");
        assert_eq!(value["headers"]["content-type"], "text/plain;charset=UTF-8");
        assert_eq!(value["id"], message.id().to_string());
        assert!(value.get("payload_base64").is_none());
    }

    #[test]
    fn test_binary_line() {
        let message = Message::new(Payload::Binary(Bytes::from_static(b"hello")), BTreeMap::new());

        let line = to_json_line(&message).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["payload_base64"], "aGVsbG8=");
        assert!(value.get("payload").is_none());
    }

    #[tokio::test]
    async fn test_drain_until_closed() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Message::new(Payload::Text("a".into()), BTreeMap::new())).await.unwrap();
        tx.send(Message::new(Payload::Text("b".into()), BTreeMap::new())).await.unwrap();
        drop(tx);

        let mut out = Vec::new();
        let written = drain_json_lines(rx, &mut out).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }
}
