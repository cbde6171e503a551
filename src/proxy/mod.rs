// Proxy service module

pub mod common;
pub mod error;
pub mod handlers;
pub mod mappers;
pub mod middleware;
pub mod security;
pub mod server;
pub mod upstream;

pub use error::ProxyError;
pub use security::ProxySecurityConfig;
