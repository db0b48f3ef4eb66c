//! End-to-end tests against a real listener.

use std::sync::Arc;
use std::time::Duration;

use http_source::config::SourceConfig;
use http_source::lifecycle::Shutdown;
use http_source::message::REQUEST_URL;
use http_source::sink::ChannelSink;
use http_source::HttpServer;
use reqwest::StatusCode;
use tokio::net::TcpListener;

mod common;
use common::{basic_auth, secured_config, PASSWORD, USER};

async fn spawn_server(
    config: SourceConfig,
) -> (
    String,
    Shutdown,
    tokio::sync::mpsc::Receiver<http_source::Message>,
    tokio::task::JoinHandle<std::io::Result<()>>,
) {
    let (sink, rx) = ChannelSink::new(16, Duration::from_millis(500));
    let server = HttpServer::new(&config, Arc::new(sink)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    (base, shutdown, rx, handle)
}

#[tokio::test]
async fn test_post_over_http() {
    let (base, shutdown, mut rx, handle) = spawn_server(SourceConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/?source=test"))
        .json(&serde_json::json!({"foo": 1, "bar": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().contains_key("x-request-id"));

    let message = rx.recv().await.unwrap();
    assert_eq!(message.payload().as_text(), Some(r#"{"foo":1,"bar":true}"#));
    assert_eq!(message.content_type(), Some("application/json;charset=UTF-8"));
    assert_eq!(
        message.header(REQUEST_URL),
        Some(format!("{base}/?source=test").as_str())
    );

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_secured_over_http() {
    let (base, shutdown, mut rx, handle) = spawn_server(secured_config(false)).await;
    let client = reqwest::Client::new();

    let response = client.post(&base).body("hello").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["status"], 401);

    let response = client
        .post(&base)
        .header("authorization", basic_auth(USER, PASSWORD))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(rx.recv().await.unwrap().payload().as_text(), Some("hello"));

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_drops_sink() {
    let (_base, shutdown, mut rx, handle) = spawn_server(SourceConfig::default()).await;

    shutdown.trigger();
    handle.await.unwrap().unwrap();

    // Every sender is gone once the server has stopped.
    assert!(rx.recv().await.is_none());
}
