//! Environment-variable configuration helpers.
//!
//! Config structs build themselves from `PAGETRACK_*` variables; a `.env`
//! file in the working directory is loaded first when present.

use std::str::FromStr;

use crate::error::{Result, TrackerError};

/// Loads `.env` if one exists. Missing files are not an error.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Reads and parses `name`. Unset variables are `Ok(None)`.
pub fn var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TrackerError::ConfigError(format!("{}={:?}: {}", name, raw, e))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(TrackerError::ConfigError(format!("{}: {}", name, e))),
    }
}

/// Reads a boolean flag. Accepts `1/0`, `true/false`, `yes/no`, `on/off`.
pub fn flag(name: &str) -> Result<Option<bool>> {
    let Some(raw) = var::<String>(name)? else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(TrackerError::ConfigError(format!(
            "{}={:?} is not a boolean",
            name, raw
        ))),
    }
}
