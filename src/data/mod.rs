//! Data module for configuration and credential management

mod config;
mod credential;

pub use config::{
    AsrConfig, Endpoint, GatewayConfig, IatConfig, SessionConfig, TlsConfig, TranscoderConfig,
    TtsConfig,
};
pub use credential::{Credentials, ENV_API_KEY, ENV_API_SECRET, ENV_APP_ID};
