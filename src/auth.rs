//! Shared-secret credential and the request gate built on it.

use crate::config::AuthConfig;
use crate::error::ConfigError;
use log::{debug, warn};
use std::env;
use std::fmt;
use subtle::ConstantTimeEq;

/// Query parameter carrying the caller's token.
pub const API_KEY_PARAM: &str = "apiKey";

/// The process-wide shared secret. Fixed for the lifetime of the process.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::Invalid("API key must not be empty".into()));
        }
        Ok(Self(secret))
    }

    /// Resolve the secret from the environment first, then from the mounted file.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        Self::from_config_with(config, |key| env::var(key).ok())
    }

    /// Like [`Credential::from_config`], with an explicit variable lookup.
    pub fn from_config_with(
        config: &AuthConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if !config.api_key_env.is_empty() {
            if let Some(value) = lookup(&config.api_key_env) {
                if !value.is_empty() {
                    debug!("API key loaded from ${}", config.api_key_env);
                    return Self::new(value);
                }
            }
        }

        if let Some(path) = &config.api_key_file {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let trimmed = raw.trim_end_matches(['\r', '\n']);
            if !trimmed.is_empty() {
                debug!("API key loaded from {:?}", path);
                return Self::new(trimmed);
            }
        }

        Err(ConfigError::MissingCredential {
            env: config.api_key_env.clone(),
        })
    }

    /// Constant-time for equal lengths; differing lengths are rejected outright.
    fn matches(&self, supplied: &str) -> bool {
        self.0.as_bytes().ct_eq(supplied.as_bytes()).into()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Stateless check of a request-supplied token against the [`Credential`].
#[derive(Debug, Clone)]
pub struct CredentialGate {
    credential: Credential,
}

impl CredentialGate {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// True iff a token was supplied and it equals the credential byte-for-byte.
    pub fn authorize(&self, supplied: Option<&str>) -> bool {
        let accepted = match supplied {
            Some(token) if !token.is_empty() => self.credential.matches(token),
            _ => false,
        };
        if !accepted {
            warn!("Unauthorized access attempt with invalid API key");
        }
        accepted
    }
}
