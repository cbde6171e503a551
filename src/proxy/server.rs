// Axum server - route table, middleware stack and lifecycle

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::sync::oneshot;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::models::AppConfig;
use crate::modules::image_store::IMAGES_ROUTE;
use crate::proxy::handlers::{self, AppState};
use crate::proxy::middleware::{auth_middleware, cors_layer, monitor_middleware};
use crate::proxy::security::ProxySecurityConfig;

// ============================================================================
// Route builders
// ============================================================================

/// Gemini and health endpoints
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::gemini::handle_health))
        .route("/api/gemini/models", get(handlers::gemini::handle_list_models))
        .route("/api/gemini/generate", post(handlers::gemini::handle_generate))
        .route(
            "/api/gemini/generate-image",
            post(handlers::gemini::handle_generate_image),
        )
        .route(
            "/api/gemini/generate-lesson-content",
            post(handlers::lesson::handle_generate_lesson_content),
        )
        .with_state(state)
}

/// Generated API description
fn doc_routes() -> Router {
    Router::new()
        .route("/doc", get(handlers::docs::handle_doc_html))
        .route("/doc.json", get(handlers::docs::handle_doc_json))
        .route("/doc.md", get(handlers::docs::handle_doc_markdown))
}

/// Full application router
pub fn build_app(
    state: AppState,
    security: Arc<ProxySecurityConfig>,
    max_body_size: usize,
) -> Router {
    let images = ServeDir::new(state.images.dir());

    Router::new()
        .merge(api_routes(state))
        .merge(doc_routes())
        .nest_service(IMAGES_ROUTE, images)
        // Middleware stack (onion model): CORS → Monitor → Auth → Handler
        // Axum layers execute bottom-to-top for requests
        .layer(axum::middleware::from_fn_with_state(security, auth_middleware))
        .layer(axum::middleware::from_fn(monitor_middleware))
        .layer(cors_layer())
        .layer(DefaultBodyLimit::max(max_body_size))
}

// ============================================================================
// AxumServer - Server lifecycle management
// ============================================================================

#[derive(Clone)]
pub struct AxumServer {
    shutdown_tx: Arc<tokio::sync::Mutex<Option<oneshot::Sender<()>>>>,
    pub local_addr: SocketAddr,
}

impl AxumServer {
    /// Bind and start serving. Returns the handle of the accept loop task.
    pub async fn start(
        config: &AppConfig,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), String> {
        let state = AppState::from_config(config);
        let security = Arc::new(ProxySecurityConfig::from_auth_config(&config.auth));
        if security.api_token.is_empty() {
            warn!("API_TOKEN is empty: every protected request will be rejected");
        }

        if let Err(e) = tokio::fs::create_dir_all(state.images.dir()).await {
            warn!(
                "Could not create images directory {}: {}",
                state.images.dir().display(),
                e
            );
        }

        let app = build_app(state, security, config.server.max_body_size);

        // Bind address
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read local address: {}", e))?;

        info!("Gemini proxy listening on http://{}", local_addr);
        info!("API docs at {}/doc", config.server.public_base_url());

        // Shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Arc::new(tokio::sync::Mutex::new(Some(shutdown_tx))),
            local_addr,
        };

        // Spawn server task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            let app_service = app.into_service();

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, remote_addr)) => {
                                let io = TokioIo::new(stream);

                                use tower::ServiceExt;
                                use hyper::body::Incoming;
                                let svc = app_service.clone().map_request(
                                    move |mut req: axum::http::Request<Incoming>| {
                                        req.extensions_mut().insert(
                                            axum::extract::ConnectInfo(remote_addr),
                                        );
                                        req
                                    },
                                );

                                let hyper_svc = TowerToHyperService::new(svc);

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, hyper_svc)
                                        .await
                                    {
                                        debug!("Connection ended: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Accept connection failed: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        info!("Gemini proxy shutting down");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    /// Signal the accept loop to stop. In-flight connections finish on their own tasks.
    pub async fn stop(&self) {
        let mut lock = self.shutdown_tx.lock().await;
        if let Some(tx) = lock.take() {
            let _ = tx.send(());
            info!("Gemini proxy stop signal sent");
        }
    }
}
