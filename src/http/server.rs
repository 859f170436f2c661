//! HTTP server setup.
//!
//! # Responsibilities
//! - Compose the route table over the request handler
//! - Wire up middleware (trailing slash, headers, API key, request ID, tracing)
//! - Serve the admin GUI, embedded or proxied in develop mode
//! - Bind the configured port and drain gracefully on shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::util::MapRequest;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::BridgeConfig;
use crate::http::gui::{self, DevProxy};
use crate::http::handlers::{admin, reprocess, transactions, RequestHandler};
use crate::http::middleware::{api_key_middleware, trim_trailing_slash, ApiKey};
use crate::lifecycle::signals::shutdown_signal;
use crate::lifecycle::StartupError;

/// The router behind trailing-slash normalization.
pub type AppService = MapRequest<Router, fn(Request) -> Request>;

/// Build the route table and middleware stack for `config`.
pub fn compose_routes(config: &BridgeConfig, handler: Arc<RequestHandler>) -> Router {
    let mut router = Router::new();

    if config.accounts.authorizing_seed.is_empty() {
        tracing::warn!(
            "accounts.authorizing_seed not provided, /authorize endpoint will not be available"
        );
    } else {
        router = router.route("/authorize", post(transactions::authorize));
    }

    router = router
        .route("/create-keypair", post(transactions::create_keypair))
        .route("/builder", post(transactions::builder))
        .route(
            "/payment",
            get(transactions::payment_query).post(transactions::payment_form),
        )
        .route("/reprocess", post(reprocess::reprocess))
        .route("/admin/received-payments", get(admin::received_payments))
        .route("/admin/received-payments/{id}", get(admin::received_payment))
        .route("/admin/sent-transactions", get(admin::sent_transactions));

    router = if config.develop {
        tracing::info!(develop_server = %config.develop_server, "Proxying admin GUI to develop server");
        let proxy = DevProxy::new(&config.develop_server);
        router.fallback(move |request: Request| proxy.clone().forward(request))
    } else {
        router
            .route("/admin", get(gui::admin_redirect))
            .route("/admin/", get(gui::admin_index))
            .route("/admin/{*path}", get(gui::admin_asset))
    };

    let mut router = router.with_state(handler);
    if !config.api_key.is_empty() {
        router = router.layer(from_fn_with_state(
            ApiKey(Arc::from(config.api_key.as_str())),
            api_key_middleware,
        ));
    }

    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// The composed application: configuration plus the wired request handler.
pub struct App {
    config: Arc<BridgeConfig>,
    handler: Arc<RequestHandler>,
}

impl App {
    pub fn new(config: Arc<BridgeConfig>, handler: Arc<RequestHandler>) -> Self {
        Self { config, handler }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn handler(&self) -> &Arc<RequestHandler> {
        &self.handler
    }

    /// Routes wrapped in trailing-slash normalization, ready to serve.
    pub fn service(&self) -> AppService {
        MapRequest::new(
            compose_routes(&self.config, self.handler.clone()),
            trim_trailing_slash as fn(Request) -> Request,
        )
    }

    /// Bind `0.0.0.0:<port>` and serve until SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<(), StartupError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(StartupError::Serve)?;
        self.serve_with(listener, shutdown_signal())
            .await
            .map_err(StartupError::Serve)
    }

    /// Serve on `listener` until `shutdown` resolves, then stop background tasks.
    pub async fn serve_with<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let service = axum::ServiceExt::<Request>::into_make_service(self.service());
        axum::serve(listener, service)
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(listener) = &self.handler.services().listener {
            listener.stop();
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
