pub mod config;
pub mod envelope;
pub mod request;

pub use config::{
    AppConfig, AuditConfig, AuthConfig, ImageConfig, LoggingConfig, PromptConfig, ServerConfig,
    UpstreamConfig,
};
pub use envelope::{ResultEnvelope, ResultInfo, TokenUsage};
pub use request::{CourseOutlineRequest, ImageRequest, LessonContentRequest, LessonContext};
