//! Metrics collection.
//!
//! # Metrics
//! - `http_source_messages_total` (counter): forwarded messages by payload kind
//! - `http_source_payload_bytes` (histogram): forwarded payload sizes
//! - `http_source_rejections_total` (counter): refused requests by reason

use metrics::{counter, histogram};

/// Record a message handed to the sink.
pub fn record_message(kind: &'static str, size: usize) {
    counter!("http_source_messages_total", "kind" => kind).increment(1);
    histogram!("http_source_payload_bytes", "kind" => kind).record(size as f64);
}

/// Record a refused request.
pub fn record_rejection(reason: &'static str) {
    counter!("http_source_rejections_total", "reason" => reason).increment(1);
}
