// Middleware stack: Monitor → Auth → Handler

pub mod auth;
pub mod cors;
pub mod monitor;

pub use auth::auth_middleware;
pub use cors::cors_layer;
pub use monitor::monitor_middleware;
