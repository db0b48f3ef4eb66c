//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use http_source::config::SourceConfig;
use http_source::message::Message;
use http_source::sink::{ChannelSink, MessageSink, SinkError};
use http_source::HttpServer;
use tokio::sync::mpsc;

pub const USER: &str = "user";
pub const PASSWORD: &str = "secret";

/// Router wired to a channel sink, plus the receiving end of that channel.
pub fn build_app(config: SourceConfig) -> (Router, mpsc::Receiver<Message>) {
    let (sink, rx) = ChannelSink::new(16, Duration::from_millis(200));
    let server = HttpServer::new(&config, Arc::new(sink)).unwrap();
    (server.router(), rx)
}

/// Router wired to a sink that always refuses.
pub fn build_failing_app(config: SourceConfig) -> Router {
    HttpServer::new(&config, Arc::new(FailingSink)).unwrap().router()
}

/// Defaults with the ingress path set to `/foo`.
pub fn foo_config() -> SourceConfig {
    let mut config = SourceConfig::default();
    config.http.path_pattern = "/foo".to_string();
    config
}

pub fn secured_config(csrf: bool) -> SourceConfig {
    let mut config = SourceConfig::default();
    config.security.enabled = true;
    config.security.csrf_enabled = csrf;
    config.security.username = USER.to_string();
    config.security.password = PASSWORD.to_string();
    config
}

pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// A POST request with an optional Content-Type.
pub fn post(uri: &str, content_type: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder.body(body.into()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub struct FailingSink;

#[async_trait]
impl MessageSink for FailingSink {
    async fn send(&self, _message: Message) -> Result<(), SinkError> {
        Err(SinkError::Closed)
    }
}
