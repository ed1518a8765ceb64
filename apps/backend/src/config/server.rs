use super::env::{parse_or, string_or, Lookup, ProcessEnv};
use crate::error::AppError;

/// HTTP bind address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup<L: Lookup + ?Sized>(env: &L) -> Result<Self, AppError> {
        Ok(Self {
            host: string_or(env, "BACKEND_HOST", "0.0.0.0"),
            port: parse_or(env, "BACKEND_PORT", 8080u16)?,
        })
    }
}
