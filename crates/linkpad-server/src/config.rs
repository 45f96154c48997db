#![forbid(unsafe_code)]

//! Environment-driven server configuration.

use std::fmt;
use std::net::SocketAddr;

use linkpad_transfer::DEFAULT_MAX_INFLATED_LEN;

pub const ENV_BIND_ADDR: &str = "LINKPAD_BIND_ADDR";
pub const ENV_MAX_TOKEN_LEN: &str = "LINKPAD_MAX_TOKEN_LEN";
pub const ENV_MAX_INFLATED_LEN: &str = "LINKPAD_MAX_INFLATED_LEN";

/// Longest token text accepted, 1 MiB.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 1024 * 1024;

/// Runtime settings for the inflate service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Tokens longer than this are rejected with 400 before decoding.
    pub max_token_len: usize,
    /// Inflated payloads larger than this fail with 500.
    pub max_inflated_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 4200)),
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            max_inflated_len: DEFAULT_MAX_INFLATED_LEN,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = parse(ENV_BIND_ADDR, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_TOKEN_LEN) {
            config.max_token_len = parse_positive(ENV_MAX_TOKEN_LEN, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_INFLATED_LEN) {
            config.max_inflated_len = parse_positive(ENV_MAX_INFLATED_LEN, &value)?;
        }
        Ok(config)
    }
}

/// An environment variable that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}={:?}: {}", self.var, self.value, self.reason)
    }
}

impl std::error::Error for ConfigError {}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError {
        var,
        value: value.to_owned(),
        reason: err.to_string(),
    })
}

fn parse_positive(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    match parse::<usize>(var, value)? {
        0 => Err(ConfigError {
            var,
            value: value.to_owned(),
            reason: "must be greater than zero".to_owned(),
        }),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn unset_environment_gives_defaults() {
        assert_eq!(ServerConfig::from_lookup(lookup(&[])), Ok(ServerConfig::default()));
        assert_eq!(ServerConfig::default().bind_addr.port(), 4200);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_BIND_ADDR, "127.0.0.1:9000"),
            (ENV_MAX_TOKEN_LEN, " 2048 "),
            (ENV_MAX_INFLATED_LEN, "4096"),
        ]))
        .expect("valid overrides");
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
        assert_eq!(config.max_token_len, 2048);
        assert_eq!(config.max_inflated_len, 4096);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = ServerConfig::from_lookup(lookup(&[(ENV_MAX_TOKEN_LEN, "0")])).expect_err("zero");
        assert_eq!(err.var, ENV_MAX_TOKEN_LEN);
        let err = ServerConfig::from_lookup(lookup(&[(ENV_BIND_ADDR, "nowhere")]))
            .expect_err("addr");
        assert!(err.to_string().starts_with("invalid LINKPAD_BIND_ADDR=\"nowhere\""));
    }
}
