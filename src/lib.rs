//! HTTP source: accepts POSTed payloads and forwards each one as a message
//! to an outbound sink.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod observability;
pub mod routing;
pub mod security;
pub mod sink;

pub use config::SourceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use message::{Message, Payload};
pub use sink::{ChannelSink, MessageSink, SinkError};
