use tower_http::cors::{Any, CorsLayer};

/// Open CORS policy: the gateway is called from browser front-ends on other origins
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
