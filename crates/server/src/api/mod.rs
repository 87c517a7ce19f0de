//! Request handlers mounted under the configured API path.

pub mod crawl;
pub mod rule;

pub use crawl::crawl_allowed;
pub use rule::{create_rule, delete_rule, get_rule, update_rule};
