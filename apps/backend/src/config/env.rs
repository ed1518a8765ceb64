use std::collections::HashMap;
use std::str::FromStr;

use crate::error::AppError;

/// Source of configuration values. Production reads the process
/// environment; tests pass a map.
pub trait Lookup {
    fn get(&self, name: &str) -> Option<String>;
}

impl Lookup for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Parse `name` if set and non-empty, otherwise fall back to `default`.
pub fn parse_or<L, T>(lookup: &L, name: &str, default: T) -> Result<T, AppError>
where
    L: Lookup + ?Sized,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup.get(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("{name}={raw:?} is invalid: {e}"))),
        _ => Ok(default),
    }
}

pub fn string_or<L>(lookup: &L, name: &str, default: &str) -> String
where
    L: Lookup + ?Sized,
{
    lookup
        .get(name)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| default.to_string())
}
