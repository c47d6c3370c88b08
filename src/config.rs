use std::{env, fmt::Display, str::FromStr};

use tracing::info;

/// Runtime configuration, read from the environment (a .env file is loaded
/// by main before this runs). Secrets have no defaults.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: String,
    pub jwt_secret: String,
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub stripe_secret_key: String,
    pub base_url: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "8080"),
            data_path: try_load("DATA_PATH", "flashdeck_data"),
            jwt_secret: require("JWT_SECRET"),
            openai_api_key: require("OPENAI_API_KEY"),
            openai_api_url: try_load(
                "OPENAI_API_URL",
                "https://api.openai.com/v1/chat/completions",
            ),
            stripe_secret_key: require("STRIPE_SECRET_KEY"),
            base_url: try_load("BASE_URL", "http://localhost:3000/"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    match value.parse() {
        Ok(parsed) => parsed,
        Err(e) => panic!("invalid {key} value {value:?}: {e}"),
    }
}

fn require(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("environment variable {key} must be set"))
}
