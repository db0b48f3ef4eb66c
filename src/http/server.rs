//! HTTP server setup and the ingress handler.
//!
//! # Responsibilities
//! - Create the Axum Router with the ingress and CSRF token handlers
//! - Wire up middleware (request id, tracing, timeout, body limit, CORS, security)
//! - Turn accepted requests into messages and hand them to the sink
//! - Serve until the shutdown signal fires

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Request, State},
    http::{header, Extensions, HeaderMap, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::SourceConfig;
use crate::http::request::{make_request_span, request_id};
use crate::http::response::IngressError;
use crate::message::{self, HeaderMapper, Message, Payload};
use crate::observability::metrics;
use crate::routing::{IngressRoute, PatternError, RouteMatch};
use crate::security::{
    cors_middleware, security_middleware, AuthFailure, CorsPolicy, CsrfTokenResponse, Principal,
    SecurityPolicy,
};
use crate::sink::MessageSink;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub route: Arc<IngressRoute>,
    pub headers: Arc<HeaderMapper>,
    pub security: Arc<SecurityPolicy>,
    pub sink: Arc<dyn MessageSink>,
}

/// HTTP server for the source.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server. Fails only on path patterns that do not parse;
    /// a validated config never does.
    pub fn new(config: &SourceConfig, sink: Arc<dyn MessageSink>) -> Result<Self, PatternError> {
        let security = Arc::new(SecurityPolicy::from_config(&config.security)?);
        let state = AppState {
            route: Arc::new(IngressRoute::from_config(&config.http.path_pattern)?),
            headers: Arc::new(HeaderMapper::new(&config.http.mapped_request_headers)),
            security,
            sink,
        };

        let router = Self::build_router(config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SourceConfig, state: AppState) -> Router {
        let cors = Arc::new(CorsPolicy::from_config(
            &config.cors,
            state.route.as_ref().clone(),
        ));
        let security = state.security.clone();

        let mut router = Router::new();
        if security.csrf().is_some() {
            // Other methods on the token path still reach the ingress handler.
            router = router.route(
                &config.security.csrf_token_path,
                get(csrf_token_handler).fallback(ingress_handler),
            );
        }

        router
            .route("/", any(ingress_handler))
            .route("/{*path}", any(ingress_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(security, security_middleware))
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Accepts a POST body and forwards it as one message.
///
/// The route is resolved before the body is read, so an unknown path is a
/// 404 whatever the body size.
async fn ingress_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    request: Request,
) -> Result<StatusCode, IngressError> {
    let path = uri.path();
    let request_id = request_id(&headers);

    match state.route.resolve(&method, path) {
        RouteMatch::Matched => {}
        RouteMatch::MethodNotAllowed => return Err(IngressError::MethodNotAllowed(method)),
        RouteMatch::NotFound => return Err(IngressError::NotFound(path.to_string())),
    }

    let body = Bytes::from_request(request, &state).await?;

    let content_type = match headers.get(header::CONTENT_TYPE) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| IngressError::BadRequest("Content-Type is not ASCII".into()))?,
        ),
        None => None,
    };
    let (payload, content_type) = Payload::decode(content_type, body)?;

    let message_headers = message_headers(
        &state.headers,
        &headers,
        &method,
        &uri,
        extensions.get::<Principal>(),
        content_type.to_string(),
    );

    let kind = payload.kind();
    let size = payload.len();
    let message = Message::new(payload, message_headers);
    let message_id = message.id();

    if let Err(e) = state.sink.send(message).await {
        tracing::error!(request_id = %request_id, error = %e, "Failed to forward message");
        return Err(e.into());
    }

    metrics::record_message(kind, size);
    tracing::debug!(
        request_id = %request_id,
        message_id = %message_id,
        payload = kind,
        bytes = size,
        "Message forwarded"
    );
    Ok(StatusCode::ACCEPTED)
}

fn message_headers(
    mapper: &HeaderMapper,
    headers: &HeaderMap,
    method: &Method,
    uri: &Uri,
    principal: Option<&Principal>,
    content_type: String,
) -> BTreeMap<String, String> {
    let mut mapped = mapper.map(headers);
    mapped.insert(message::CONTENT_TYPE.to_string(), content_type);
    mapped.insert(message::REQUEST_METHOD.to_string(), method.to_string());
    mapped.insert(message::REQUEST_URL.to_string(), request_url(headers, uri));
    if let Some(principal) = principal {
        mapped.insert(message::USER_PRINCIPAL.to_string(), principal.name.clone());
    }
    mapped
}

/// `http://<host><path>[?query]`, falling back to the URI authority.
fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("http://{host}{path_and_query}")
}

/// Issues a CSRF token for the authenticated user.
async fn csrf_token_handler(
    State(state): State<AppState>,
    extensions: Extensions,
) -> Result<Response, IngressError> {
    let Some(tokens) = state.security.csrf() else {
        return Err(IngressError::NotFound("CSRF tokens are disabled".into()));
    };
    let Some(principal) = extensions.get::<Principal>() else {
        return Err(IngressError::Unauthorized(AuthFailure::MissingCredentials));
    };

    tracing::debug!(user = %principal.name, "Issuing CSRF token");
    Ok(Json(CsrfTokenResponse::new(tokens.issue(&principal.name))).into_response())
}
