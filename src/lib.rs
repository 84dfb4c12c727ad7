//! Layered properties configuration library.
//!
//! Resolves the active environment, enumerates candidate `.properties` files,
//! merges them in precedence order and expands `${key}` references.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod pool;
pub mod resource;

pub use config::{Properties, resolve};
pub use error::{ConfigError, ConfigResult, ErrorCode};
