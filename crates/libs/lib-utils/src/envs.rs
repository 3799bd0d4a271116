//! # Environment Variables
//!
//! Helpers for reading and parsing environment-style values.
//!
//! Parsing is split from lookup so that callers can resolve values from the
//! process environment or from any other key/value source.

use std::env;
use std::str::FromStr;

/// Get an environment variable by name.
pub fn get_env(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingEnv(name))
}

/// Parse an optional raw value, falling back to `default` when absent or blank.
pub fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, Error> {
    match raw {
        Some(val) if !val.trim().is_empty() => {
            val.trim().parse::<T>().map_err(|_| Error::WrongFormat(name))
        }
        _ => Ok(default),
    }
}

/// Parse an optional boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
pub fn parse_flag(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, Error> {
    let Some(val) = raw else {
        return Ok(default);
    };

    match val.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::WrongFormat(name)),
    }
}

// region:    --- Error
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    MissingEnv(&'static str),
    WrongFormat(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error
