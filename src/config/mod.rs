//! Configuration for the petpet host
//!
//! Provides types, discovery and loading for `petpet.toml`.

pub mod loader;
pub mod schema;

pub use loader::{
    default_config, find_config, find_config_from, load_config, merge_cli_overrides, CliOverrides,
    ConfigError,
};
pub use schema::*;
