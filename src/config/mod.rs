//! Service configuration.
//!
//! A single [`ServiceConfig`] is loaded at start-up by [`load_configuration`]
//! and handed to the components that need it.

mod defaults;
mod loader;

pub use defaults::{DEFAULT_USER_AGENT, SeoulOpenApiConfig, ServiceConfig, WeatherConfig};
pub use loader::{ENV_PREFIX, get_default_config, load_configuration, profile_path, write_config_to};
