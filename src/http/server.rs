//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the lookup handler
//! - Wire up middleware (request ID, tracing, timeout, CORS, rate limit)
//! - Build the signature gate and booking resolver from config
//! - Bind server to listener and shut down gracefully

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::bookings::BookingResolver;
use crate::config::{CorsConfig, ServiceConfig};
use crate::http::bookings::{get_bookings, BOOKINGS_PATH};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::shutdown;
use crate::security::{rate_limit_middleware, RateLimiter, SignatureGate};
use crate::upstream::{BookingPlatform, NexudusClient, UpstreamResult};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<SignatureGate>,
    pub resolver: Arc<BookingResolver>,
}

/// HTTP server for the bookings proxy.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    limiter: Option<Arc<RateLimiter>>,
}

impl HttpServer {
    /// Create a server talking to the configured booking platform.
    pub fn new(config: ServiceConfig) -> UpstreamResult<Self> {
        let platform = Arc::new(NexudusClient::new(&config.upstream)?);
        Ok(Self::with_platform(config, platform))
    }

    /// Create a server on top of any [`BookingPlatform`].
    pub fn with_platform(config: ServiceConfig, platform: Arc<dyn BookingPlatform>) -> Self {
        let state = AppState {
            gate: Arc::new(SignatureGate::new(config.signing.secret.clone())),
            resolver: Arc::new(BookingResolver::new(
                platform,
                config.signing.dedicated_marker.clone(),
            )),
        };

        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit)));

        let router = Self::build_router(&config, state, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &ServiceConfig,
        state: AppState,
        limiter: Option<Arc<RateLimiter>>,
    ) -> Router {
        let mut router = Router::new()
            .route(BOOKINGS_PATH, get(get_bookings))
            .with_state(state);

        if let Some(limiter) = limiter {
            router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        if config.cors.enabled {
            router = router.layer(cors_layer(&config.cors));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Router with all layers, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit = self.limiter.is_some(),
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        if let Some(limiter) = self.limiter.clone() {
            let stop = shutdown_rx.resubscribe();
            tokio::spawn(prune_rate_limiter(limiter, stop));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .expose_headers([X_REQUEST_ID])
        .allow_origin(origins)
}

/// Periodically drop elapsed rate-limit windows.
async fn prune_rate_limiter(limiter: Arc<RateLimiter>, mut stop: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(limiter.window());
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                limiter.prune();
                tracing::debug!(tracked_clients = limiter.tracked_clients(), "Rate limiter pruned");
            }
            _ = stop.recv() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use secrecy::SecretString;
    use tower::ServiceExt;

    fn config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.upstream.username = "api-user".into();
        config.upstream.password = SecretString::new("api-pass".into());
        config.signing.secret = SecretString::new("secret".into());
        config.rate_limit.enabled = false;
        config
    }

    async fn preflight(config: ServiceConfig, origin: &str) -> axum::http::Response<Body> {
        let server = HttpServer::new(config).unwrap();
        server
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(BOOKINGS_PATH)
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_permissive_by_default() {
        let response = preflight(config(), "https://members.example").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_cors_allow_list() {
        let mut config = config();
        config.cors.allowed_origins = vec!["https://members.example".into()];

        let allowed = preflight(config.clone(), "https://members.example").await;
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://members.example"
        );

        let denied = preflight(config, "https://elsewhere.example").await;
        assert!(!denied.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let server = HttpServer::new(config()).unwrap();
        let response = server
            .router()
            .oneshot(Request::builder().uri("/api/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let server = HttpServer::new(config()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = crate::lifecycle::Shutdown::new();
        let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
