use devcoff_primitives::env::Environment;
use devcoff_primitives::TicketTemplate;
use devcoff_verifier::SnarkjsConfig;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;
use url::Url;

/// Non-secret server settings, read from `config.json`.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server_port: u16,
    pub log_level: String,
    pub verification_timeout_seconds: u32,
    pub verification_key_path: PathBuf,
    #[serde(default = "default_verifier_program")]
    pub verifier_program: String,
    #[serde(default)]
    pub verifier_args: Vec<String>,
    /// Falls back to the OS temp dir.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    pub wallet_url: String,
    /// Used as the popup return origin when a request carries no `Origin` header.
    pub public_origin: String,
    #[serde(default = "default_credential_title")]
    pub credential_title: String,
    #[serde(default)]
    pub ticket: TicketTemplate,
}

fn default_verifier_program() -> String {
    "snarkjs".to_string()
}

fn default_credential_title() -> String {
    "Devcoff".to_string()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("Failed to parse log level: {0}")]
    LogLevelParseError(String),
    #[error("Failed to decode hex: {0}")]
    HexDecodeError(#[from] hex::FromHexError),
    #[error("Missing required environment variable {0}")]
    MissingVariable(&'static str),
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(data)?;
        Ok(config)
    }

    pub fn wallet_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.wallet_url).map_err(ConfigError::from)
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::LogLevelParseError(self.log_level.clone()))
    }

    pub fn verification_timeout(&self) -> Duration {
        Duration::from_secs(self.verification_timeout_seconds as u64)
    }

    pub fn verifier_config(&self) -> SnarkjsConfig {
        SnarkjsConfig {
            program: self.verifier_program.clone(),
            args: self.verifier_args.clone(),
            verification_key: self.verification_key_path.clone(),
            scratch_dir: self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir),
            timeout: self.verification_timeout(),
        }
    }
}

/// Issuer identifiers and secrets, read from the environment.
pub struct IssuerSettings {
    pub event_id: String,
    pub product_id: String,
    pub signing_key: SigningKey,
    /// Side-channel link shown to attendees after a successful issuance.
    pub tg_link: Option<String>,
}

impl IssuerSettings {
    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        Self::from_lookup(environment, |key| std::env::var(key).ok())
    }

    /// Production refuses to start without `EVENT_ID`, `PRODUCT_ID` and `PRIVATE_KEY`.
    /// Development substitutes empty ids and a throwaway key.
    pub fn from_lookup<F>(environment: Environment, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let required_id = |key: &'static str| match present(key) {
            Some(value) => Ok(value),
            None if environment.is_production() => Err(ConfigError::MissingVariable(key)),
            None => {
                tracing::warn!("{key} is not set, issuing tickets with an empty value");
                Ok(String::new())
            }
        };
        let event_id = required_id("EVENT_ID")?;
        let product_id = required_id("PRODUCT_ID")?;

        let signing_key = match present("PRIVATE_KEY") {
            Some(value) => parse_signing_key(&value)?,
            None if environment.is_production() => {
                return Err(ConfigError::MissingVariable("PRIVATE_KEY"))
            }
            None => {
                tracing::warn!("PRIVATE_KEY is not set, signing with an ephemeral key");
                SigningKey::generate(&mut OsRng)
            }
        };

        Ok(Self {
            event_id,
            product_id,
            signing_key,
            tg_link: present("TG_LINK"),
        })
    }
}

impl fmt::Debug for IssuerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerSettings")
            .field("event_id", &self.event_id)
            .field("product_id", &self.product_id)
            .field("signing_key", &"<redacted>")
            .field("tg_link", &self.tg_link)
            .finish()
    }
}

/// Hex encoded 32 byte Ed25519 seed, with or without a `0x` prefix.
pub fn parse_signing_key(value: &str) -> Result<SigningKey, ConfigError> {
    let value = value.trim();
    let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))?;
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ConfigError::InvalidSigningKey(format!("expected 32 bytes, got {}", bytes.len()))
    })?;
    Ok(SigningKey::from_bytes(&seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "0x9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn production_requires_issuer_variables() {
        let err = IssuerSettings::from_lookup(
            Environment::Production,
            lookup(&[("EVENT_ID", "event"), ("PRIVATE_KEY", KEY)]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable("PRODUCT_ID")));

        let err = IssuerSettings::from_lookup(
            Environment::Production,
            lookup(&[("EVENT_ID", "event"), ("PRODUCT_ID", "product")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable("PRIVATE_KEY")));
    }

    #[test]
    fn development_defaults_missing_values() {
        let settings =
            IssuerSettings::from_lookup(Environment::Development, lookup(&[("TG_LINK", "")]))
                .unwrap();
        assert_eq!(settings.event_id, "");
        assert_eq!(settings.product_id, "");
        assert_eq!(settings.tg_link, None);
    }

    #[test]
    fn production_settings_load() {
        let settings = IssuerSettings::from_lookup(
            Environment::Production,
            lookup(&[
                ("EVENT_ID", "event"),
                ("PRODUCT_ID", "product"),
                ("PRIVATE_KEY", KEY),
                ("TG_LINK", "https://t.me/+devcoff"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.event_id, "event");
        assert_eq!(settings.tg_link.as_deref(), Some("https://t.me/+devcoff"));
        assert_eq!(
            settings.signing_key.to_bytes(),
            parse_signing_key(KEY.trim_start_matches("0x"))
                .unwrap()
                .to_bytes()
        );
        assert!(!format!("{settings:?}").contains("9d61b1"));
    }

    #[test]
    fn malformed_key_is_fatal_everywhere() {
        for environment in [Environment::Development, Environment::Production] {
            let err = IssuerSettings::from_lookup(
                environment,
                lookup(&[
                    ("EVENT_ID", "event"),
                    ("PRODUCT_ID", "product"),
                    ("PRIVATE_KEY", "abcd"),
                ]),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSigningKey(_)));
        }
        assert!(matches!(
            parse_signing_key("zz"),
            Err(ConfigError::HexDecodeError(_))
        ));
    }

    #[test]
    fn config_parses_with_defaults() {
        let config = Config::from_json(
            r#"{
                "server_port": 3000,
                "log_level": "debug",
                "verification_timeout_seconds": 20,
                "verification_key_path": "public/verification_key.json",
                "wallet_url": "https://staging.zupass.org",
                "public_origin": "http://localhost:3000"
            }"#,
        )
        .unwrap();
        assert_eq!(config.log_level().unwrap(), Level::DEBUG);
        assert_eq!(config.credential_title, "Devcoff");
        assert_eq!(config.ticket, TicketTemplate::default());

        let verifier = config.verifier_config();
        assert_eq!(verifier.program, "snarkjs");
        assert_eq!(verifier.timeout, Duration::from_secs(20));
        assert_eq!(verifier.scratch_dir, std::env::temp_dir());
    }

    #[test]
    fn bad_log_level_is_reported() {
        let config = Config::from_json(
            r#"{
                "server_port": 3000,
                "log_level": "loud",
                "verification_timeout_seconds": 20,
                "verification_key_path": "vk.json",
                "wallet_url": "https://staging.zupass.org",
                "public_origin": "http://localhost:3000"
            }"#,
        )
        .unwrap();
        assert!(matches!(
            config.log_level(),
            Err(ConfigError::LogLevelParseError(_))
        ));
    }
}
