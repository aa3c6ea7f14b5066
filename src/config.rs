//! Runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default lifetime of a verification code.
pub const DEFAULT_CODE_VALIDITY: Duration = Duration::from_secs(120);

/// Default display name of the verification email sender.
pub const DEFAULT_SENDER_NAME: &str = "Layer8 team";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings of the verification flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sender address of verification emails.
    pub admin_email: String,
    /// Sender display name of verification emails.
    pub sender_display_name: String,
    /// How long an issued code stays valid.
    pub code_validity: Duration,
}

/// Where Groth16 keys come from on startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyConfig {
    /// Run the trusted setup on boot instead of loading the latest keys.
    pub generate_new_keys: bool,
    /// File holding the latest key pair.
    pub key_file: Option<PathBuf>,
}

impl KeyConfig {
    /// Read key settings from the process environment.
    ///
    /// - `GENERATE_NEW_ZK_SNARKS_KEYS` (`true`/`false`)
    /// - `ZK_KEY_FILE`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read key settings through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("GENERATE_NEW_ZK_SNARKS_KEYS") {
            config.generate_new_keys = raw.trim().parse().map_err(|e: std::str::ParseBoolError| {
                ConfigError::Invalid {
                    name: "GENERATE_NEW_ZK_SNARKS_KEYS",
                    reason: e.to_string(),
                }
            })?;
        }

        config.key_file = lookup("ZK_KEY_FILE").map(PathBuf::from);

        Ok(config)
    }
}

impl Config {
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
            sender_display_name: DEFAULT_SENDER_NAME.to_string(),
            code_validity: DEFAULT_CODE_VALIDITY,
        }
    }

    /// Read settings from the process environment.
    ///
    /// - `ADMIN_EMAIL_ADDRESS` (required)
    /// - `VERIFICATION_SENDER_NAME`
    /// - `VERIFICATION_CODE_VALIDITY_SECONDS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_email = lookup("ADMIN_EMAIL_ADDRESS").ok_or(ConfigError::Missing("ADMIN_EMAIL_ADDRESS"))?;
        let mut config = Self::new(admin_email);

        if let Some(name) = lookup("VERIFICATION_SENDER_NAME") {
            config.sender_display_name = name;
        }

        if let Some(raw) = lookup("VERIFICATION_CODE_VALIDITY_SECONDS") {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "VERIFICATION_CODE_VALIDITY_SECONDS",
                reason: e.to_string(),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "VERIFICATION_CODE_VALIDITY_SECONDS",
                    reason: "must be positive".to_string(),
                });
            }
            config.code_validity = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("ADMIN_EMAIL_ADDRESS", "layer8@email.com")])).unwrap();

        assert_eq!(config, Config::new("layer8@email.com"));
        assert_eq!(config.code_validity, Duration::from_secs(120));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ADMIN_EMAIL_ADDRESS", "layer8@email.com"),
            ("VERIFICATION_SENDER_NAME", "Support"),
            ("VERIFICATION_CODE_VALIDITY_SECONDS", "300"),
        ]))
        .unwrap();

        assert_eq!(config.sender_display_name, "Support");
        assert_eq!(config.code_validity, Duration::from_secs(300));
    }

    #[test]
    fn test_key_config() {
        assert_eq!(KeyConfig::from_lookup(lookup(&[])).unwrap(), KeyConfig::default());

        let config = KeyConfig::from_lookup(lookup(&[
            ("GENERATE_NEW_ZK_SNARKS_KEYS", "true"),
            ("ZK_KEY_FILE", "/tmp/keys.bin"),
        ]))
        .unwrap();
        assert!(config.generate_new_keys);
        assert_eq!(config.key_file, Some(PathBuf::from("/tmp/keys.bin")));
    }

    #[test]
    fn test_missing_admin_email() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("ADMIN_EMAIL_ADDRESS"))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let bad_duration = Config::from_lookup(lookup(&[
            ("ADMIN_EMAIL_ADDRESS", "a@b.c"),
            ("VERIFICATION_CODE_VALIDITY_SECONDS", "two minutes"),
        ]));
        assert!(matches!(bad_duration, Err(ConfigError::Invalid { .. })));

        let zero = Config::from_lookup(lookup(&[
            ("ADMIN_EMAIL_ADDRESS", "a@b.c"),
            ("VERIFICATION_CODE_VALIDITY_SECONDS", "0"),
        ]));
        assert!(matches!(zero, Err(ConfigError::Invalid { .. })));

        let bad_flag = KeyConfig::from_lookup(lookup(&[("GENERATE_NEW_ZK_SNARKS_KEYS", "yes")]));
        assert!(matches!(bad_flag, Err(ConfigError::Invalid { .. })));
    }
}
