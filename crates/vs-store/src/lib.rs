pub mod config;
pub mod error;
pub mod schema;
pub mod store;

pub use config::{Config, cache_path, default_base_dir, resolve_config_path};
pub use error::{Result, StoreError};
pub use store::{CacheStats, Store};
