//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, level names via the severity mapper)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → LoggingConfig borrowed once by Logger::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the logger never sees later changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{FileLogConfig, ListenerConfig, LoggingConfig, ServiceConfig};
