//! Project configuration for jobpack artifact bundles.
//!
//! A project describes what goes into a bundle (name, version, declared
//! dependencies, source trees) and where the bundle is published (bucket,
//! key prefixes, access control). Settings are read from `jobpack.toml`,
//! optionally overridden with `KEY=VALUE` properties, and resolved once into
//! an immutable [`ProjectConfig`] that the packaging pipeline receives
//! explicitly.
//!
//! # Modules
//!
//! - [`config`] - File model, defaults, and resolution
//! - [`error`] - Configuration error types
//! - [`properties`] - Dotted property keys and `KEY=VALUE` overrides

pub mod config;
pub mod error;
pub mod properties;

pub use config::{
    ConfigFile, NotificationSettings, PackageSettings, ProjectConfig, ProjectLayout,
    StoreSettings,
};
pub use error::ConfigError;
pub use properties::Property;
