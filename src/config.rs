//! Server configuration: a `serde`-deserialized [`Config`] loaded from
//! a TOML file, plus the duration-string helper used for its
//! human-writable duration fields.

use anyhow::Result;
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use std::fmt;

fn default_server_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".into())
}

fn default_server_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_addr() -> String {
    ":119".to_string()
}

fn default_local_log_group() -> String {
    "local.nntp.postus.log".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    600
}

/// Parse a duration string like `"30s"`, `"10m"`, `"1h"`, `"1d"` into
/// seconds. A bare integer is taken as a count of seconds.
pub fn parse_duration_secs(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (digits, factor) = match trimmed.chars().last()? {
        's' | 'S' => (&trimmed[..trimmed.len() - 1], 1u64),
        'm' | 'M' => (&trimmed[..trimmed.len() - 1], 60u64),
        'h' | 'H' => (&trimmed[..trimmed.len() - 1], 60u64 * 60),
        'd' | 'D' => (&trimmed[..trimmed.len() - 1], 60u64 * 60 * 24),
        'w' | 'W' => (&trimmed[..trimmed.len() - 1], 60u64 * 60 * 24 * 7),
        '0'..='9' => (trimmed, 1u64),
        _ => return None,
    };
    digits.trim().parse::<u64>().ok().and_then(|n| n.checked_mul(factor))
}

fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct DurationVisitor;

    impl Visitor<'_> for DurationVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like '30s', '10m', '1h', or a plain integer of seconds")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            parse_duration_secs(v).ok_or_else(|| de::Error::custom(format!("invalid duration: {v}")))
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}

/// Server-wide configuration, deserialized from the TOML file passed
/// via `--config` or `NNTP_POSTUS_CONFIG`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the server listens on, e.g. `"0.0.0.0:119"`.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Name presented in the greeting and as the `From`/`created_by`
    /// identity of the local event log newsgroup.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Version string presented in the greeting, alongside the server name.
    #[serde(default = "default_server_version")]
    pub server_version: String,

    /// Newsgroup name the engine appends a "connection opened" article
    /// to on every accepted connection.
    #[serde(default = "default_local_log_group")]
    pub local_log_group: String,

    #[serde(default = "default_idle_timeout_secs", deserialize_with = "deserialize_duration_secs")]
    pub idle_timeout_secs: u64,

    /// Whether a session with no authenticated subject may POST.
    #[serde(default)]
    pub allow_anonymous_posting: bool,

    /// Whether AUTHINFO is accepted over a connection that isn't
    /// protected by TLS. This crate carries no TLS layer of its own
    /// (§1), so this toggle exists for deployments that terminate TLS
    /// in front of it and want the behavior explicit rather than
    /// implicitly always-on.
    #[serde(default = "default_true")]
    pub allow_auth_insecure_connections: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read configuration file '{path}': {e}"))?;
        let cfg: Config = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("failed to parse configuration file '{path}': {e}"))?;
        Ok(cfg)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            server_name: default_server_name(),
            server_version: default_server_version(),
            local_log_group: default_local_log_group(),
            idle_timeout_secs: default_idle_timeout_secs(),
            allow_anonymous_posting: false,
            allow_auth_insecure_connections: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_strings_parse_to_seconds() {
        assert_eq!(parse_duration_secs("30s"), Some(30));
        assert_eq!(parse_duration_secs("10m"), Some(600));
        assert_eq!(parse_duration_secs("1h"), Some(3600));
        assert_eq!(parse_duration_secs("1d"), Some(86400));
        assert_eq!(parse_duration_secs("45"), Some(45));
        assert_eq!(parse_duration_secs(""), None);
    }

    #[test]
    fn config_from_toml_applies_defaults() {
        let cfg: Config = toml::from_str(r#"addr = "0.0.0.0:119""#).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:119");
        assert_eq!(cfg.idle_timeout_secs, 600);
        assert!(!cfg.allow_anonymous_posting);
    }

    #[test]
    fn config_idle_timeout_accepts_duration_string() {
        let cfg: Config = toml::from_str(
            r#"
            addr = "0.0.0.0:119"
            idle_timeout_secs = "5m"
        "#,
        )
        .unwrap();
        assert_eq!(cfg.idle_timeout_secs, 300);
    }
}
