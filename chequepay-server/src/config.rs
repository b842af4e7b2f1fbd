//! Server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4444
//!
//! [lightning]
//! base_url = "https://localhost:8080"
//! macaroon_path = "$HOME/.lnd/data/chain/bitcoin/mainnet/admin.macaroon"
//! tls_cert_path = "$HOME/.lnd/tls.cert"
//!
//! [adaptor]
//! adaptor_fee_msat = 42
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port
//! - Anything referenced by `$VAR` in the config file

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chequepay::AdaptorConfig;
use chequepay_lnd::{LndClient, LndClientError, Macaroon, TlsTrust, normalize_base_url};
use serde::{Deserialize, Serialize};

/// Errors raised while loading configuration or connecting the backend.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`ServerConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Neither `macaroon_hex` nor `macaroon_path` is set.
    #[error("lightning.macaroon_hex or lightning.macaroon_path is required")]
    MissingMacaroon,
    /// The LND client could not be set up.
    #[error("lightning backend: {0}")]
    Lnd(#[from] LndClientError),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `4444`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// LND connection.
    pub lightning: LightningConfig,

    /// Quote and pay pipeline parameters.
    #[serde(default)]
    pub adaptor: AdaptorConfig,
}

/// Connection settings for the LND REST gateway.
#[derive(Clone, Serialize, Deserialize)]
pub struct LightningConfig {
    /// Gateway URL, e.g. `https://localhost:8080`.
    pub base_url: String,

    /// Hex macaroon. Takes precedence over `macaroon_path`.
    #[serde(default)]
    pub macaroon_hex: Option<String>,

    /// Path to a binary macaroon file.
    #[serde(default)]
    pub macaroon_path: Option<PathBuf>,

    /// PEM certificate to pin. Without it any certificate is accepted.
    #[serde(default)]
    pub tls_cert_path: Option<PathBuf>,

    /// Per-request timeout in seconds (default: `60`).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LightningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightningConfig")
            .field("base_url", &self.base_url)
            .field("macaroon_hex", &self.macaroon_hex.as_ref().map(|_| "<redacted>"))
            .field("macaroon_path", &self.macaroon_path)
            .field("tls_cert_path", &self.tls_cert_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

const fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

const fn default_port() -> u16 {
    4444
}

const fn default_timeout_secs() -> u64 {
    60
}

impl ServerConfig {
    /// Loads configuration from `path`.
    ///
    /// After loading, all string values with `$VAR` / `${VAR}` references
    /// are expanded from the process environment. `HOST` and `PORT` env vars
    /// override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;

        // Allow HOST / PORT env overrides
        if let Ok(host) = std::env::var("HOST")
            && let Ok(addr) = host.parse()
        {
            config.host = addr;
        }
        if let Ok(port) = std::env::var("PORT")
            && let Ok(p) = port.parse()
        {
            config.port = p;
        }

        Ok(config)
    }

    /// Parses configuration from TOML text, expanding environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(&expand_env_vars(content))?)
    }
}

impl LightningConfig {
    /// Resolves the macaroon from `macaroon_hex` or `macaroon_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingMacaroon`] if neither is set, or the
    /// error from parsing or reading it.
    pub fn macaroon(&self) -> Result<Macaroon, ConfigError> {
        match (&self.macaroon_hex, &self.macaroon_path) {
            (Some(hex), _) => Ok(Macaroon::from_hex(hex)?),
            (None, Some(path)) => Ok(Macaroon::from_file(path)?),
            (None, None) => Err(ConfigError::MissingMacaroon),
        }
    }

    /// Reads the pinned certificate, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the certificate file cannot be read.
    pub fn tls_trust(&self) -> Result<TlsTrust, ConfigError> {
        let Some(path) = &self.tls_cert_path else {
            tracing::warn!("lightning.tls_cert_path not set, accepting any certificate from LND");
            return Ok(TlsTrust::AcceptInvalid);
        };
        let pem = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(TlsTrust::Certificate(pem))
    }

    /// Builds the LND client described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL, macaroon or certificate is unusable.
    pub fn connect(&self) -> Result<LndClient, ConfigError> {
        let url = normalize_base_url(&self.base_url)?;
        let client = LndClient::try_new(url, &self.macaroon()?, &self.tls_trust()?)?
            .with_timeout(Duration::from_secs(self.timeout_secs));
        Ok(client)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match std::env::var(&name) {
            Ok(value) if !name.is_empty() => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            [lightning]
            base_url = "https://localhost:8080"
            macaroon_hex = "0201"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 4444);
        assert_eq!(config.host, default_host());
        assert_eq!(config.lightning.timeout_secs, 60);
        assert_eq!(config.adaptor, AdaptorConfig::default());
        assert_eq!(config.lightning.macaroon().unwrap().to_hex(), "0201");
    }

    #[test]
    fn test_adaptor_section_overrides() {
        let config = ServerConfig::from_toml(
            r#"
            port = 9000
            [lightning]
            base_url = "https://localhost:8080"
            [adaptor]
            adaptor_fee_msat = 1000
            cheque_timeout_margin_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.adaptor.adaptor_fee_msat, 1000);
        assert_eq!(config.adaptor.cheque_timeout_margin_ms, 5000);
        assert_eq!(config.adaptor.final_cltv_delta, 100);
        assert!(matches!(
            config.lightning.macaroon(),
            Err(ConfigError::MissingMacaroon)
        ));
    }

    #[test]
    fn test_missing_lightning_section_is_an_error() {
        assert!(matches!(
            ServerConfig::from_toml("port = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only, the variable name is unique to this test.
        unsafe { std::env::set_var("CHEQUEPAY_TEST_MACAROON", "abcd") };
        assert_eq!(expand_env_vars("m = \"$CHEQUEPAY_TEST_MACAROON\""), "m = \"abcd\"");
        assert_eq!(expand_env_vars("${CHEQUEPAY_TEST_MACAROON}/x"), "abcd/x");
        assert_eq!(expand_env_vars("$CHEQUEPAY_TEST_UNSET_1"), "$CHEQUEPAY_TEST_UNSET_1");
        assert_eq!(expand_env_vars("${CHEQUEPAY_TEST_UNSET_2}"), "${CHEQUEPAY_TEST_UNSET_2}");
        assert_eq!(expand_env_vars("cost: $5"), "cost: $5");
        assert_eq!(expand_env_vars("a $ b"), "a $ b");
    }

    #[test]
    fn test_debug_redacts_macaroon() {
        let config = ServerConfig::from_toml(
            r#"
            [lightning]
            base_url = "https://localhost:8080"
            macaroon_hex = "0201036c6e64"
            "#,
        )
        .unwrap();
        assert!(!format!("{config:?}").contains("0201036c6e64"));
    }
}
