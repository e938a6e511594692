pub mod discovery;
pub mod error;
pub mod health;
pub mod jobs;
pub mod onboarding;

pub use discovery::trigger_discovery_handler;
pub use error::ApiError;
pub use health::health_handler;
pub use jobs::{
    reprocess_logs_handler, reprocess_status_handler, start_reprocess_handler,
    stop_reprocess_handler,
};
pub use onboarding::onboard_handler;
