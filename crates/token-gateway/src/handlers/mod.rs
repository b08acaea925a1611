//! HTTP request handlers for the Token Gateway.

pub mod devices;
pub mod health;
pub mod metrics;
pub mod pages;
pub mod tokens;

pub use devices::list_devices;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use pages::{publisher_page, viewer_page};
pub use tokens::{get_publisher_token, get_viewer_token};
