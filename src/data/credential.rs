//! Service Credentials
//!
//! Holds the application id / key / secret used to sign every session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GatewayError, GatewayResult};

/// Environment variable overriding the application id
pub const ENV_APP_ID: &str = "XFYUN_APPID";
/// Environment variable overriding the API key
pub const ENV_API_KEY: &str = "XFYUN_APIKEY";
/// Environment variable overriding the API secret
pub const ENV_API_SECRET: &str = "XFYUN_SECRET";

/// Credential set for the speech service
///
/// Loaded once at startup and shared read-only (`Arc<Credentials>`) by every
/// session afterwards.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

impl Credentials {
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Check if credentials are complete
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Fail with a config error naming every missing value
    pub fn validate(&self) -> GatewayResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::Config(format!(
                "missing credentials: {}",
                missing.join(", ")
            )))
        }
    }

    /// Replace fields with any non-empty values found in the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            (ENV_APP_ID, &mut self.app_id),
            (ENV_API_KEY, &mut self.api_key),
            (ENV_API_SECRET, &mut self.api_secret),
        ];
        for (name, field) in fields {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *field = value.trim().to_string();
            }
        }
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.app_id.trim().is_empty() {
            missing.push(ENV_APP_ID);
        }
        if self.api_key.trim().is_empty() {
            missing.push(ENV_API_KEY);
        }
        if self.api_secret.trim().is_empty() {
            missing.push(ENV_API_SECRET);
        }
        missing
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
