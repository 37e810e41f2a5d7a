pub mod api_observability;
pub mod app_config;
pub mod directory;
pub mod dispatcher;
pub mod queue;

// Re-export main types for easier imports
pub use api_observability::{ApiConfig, ObservabilityConfig};
pub use app_config::AppConfig;
pub use directory::DirectoryConfig;
pub use dispatcher::{DispatcherConfig, FailurePolicyKind};
pub use queue::{mask_url_password, QueueBackend, QueueConfig};
