pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod repository;
pub mod test_utils;

pub use error::{RepoError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
