mod loader;
mod paths;
mod types;

pub use types::Config;

/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "SPOT_CONSOLE_API_URL";
