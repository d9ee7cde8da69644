use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL for the local transfer ledger
    #[serde(default)]
    pub postgres_url: Option<String>,
    pub auth: AuthConfig,
    pub vault: VaultConfig,
    pub sap: SapConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Verification settings for the bearer tokens issued by the local login
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VaultConfig {
    /// AES-256 key, 64 hex characters
    pub key_hex: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

fn default_session_ttl_secs() -> u64 {
    7200
}

fn default_purge_interval_secs() -> u64 {
    60
}

impl VaultConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }
}

/// How RFC calls reach SAP
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SapTransportKind {
    /// HTTP/JSON RFC gateway at `base_url`
    #[default]
    Gateway,
    /// In-process stand-in with demo data
    Simulated,
}

/// SAP application server settings.
///
/// `ashost`, `sysnr` and `client` are forwarded to the RFC gateway on every
/// call; `base_url` is the gateway itself.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SapConfig {
    #[serde(default)]
    pub transport: SapTransportKind,
    #[serde(default)]
    pub base_url: String,
    pub ashost: String,
    pub sysnr: String,
    pub client: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_lang() -> String {
    "EN".to_string()
}

fn default_call_timeout_secs() -> u64 {
    30
}

impl Default for SapConfig {
    fn default() -> Self {
        Self {
            transport: SapTransportKind::default(),
            base_url: "http://localhost:8000".to_string(),
            ashost: "localhost".to_string(),
            sysnr: "00".to_string(),
            client: "100".to_string(),
            lang: default_lang(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl SapConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryConfig {
    pub default_limit: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { default_limit: 50 }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, then apply secret overrides from the environment.
    pub fn load(env: &str) -> Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config yaml")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.postgres_url = Some(url);
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(key) = std::env::var("SAP_VAULT_KEY") {
            self.vault.key_hex = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let key = hex::decode(self.vault.key_hex.trim()).context("vault.key_hex is not hex")?;
        if key.len() != 32 {
            bail!("vault.key_hex must encode 32 bytes, got {}", key.len());
        }
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must not be empty");
        }
        if self.sap.transport == SapTransportKind::Gateway && self.sap.base_url.trim().is_empty() {
            bail!("sap.base_url must be set for the gateway transport");
        }
        for (name, value) in [
            ("sap.ashost", &self.sap.ashost),
            ("sap.sysnr", &self.sap.sysnr),
            ("sap.client", &self.sap.client),
        ] {
            if value.trim().is_empty() {
                bail!("{} must be set", name);
            }
        }
        if self.sap.call_timeout_secs == 0 {
            bail!("sap.call_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
log_level: info
log_dir: ./logs
log_file: hu_transfer.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
auth:
  jwt_secret: dev-secret
vault:
  key_hex: "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
sap:
  base_url: http://localhost:8000
  ashost: 192.168.254.154
  sysnr: "01"
  client: "300"
"#;

    #[test]
    fn test_parse_applies_defaults() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.sap.lang, "EN");
        assert_eq!(config.sap.call_timeout(), Duration::from_secs(30));
        assert_eq!(config.vault.session_ttl(), Duration::from_secs(7200));
        assert_eq!(config.history.default_limit, 50);
        assert!(config.postgres_url.is_none());
        assert_eq!(config.sap.transport, SapTransportKind::Gateway);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_simulated_transport_needs_no_base_url() {
        let yaml = SAMPLE
            .replace("  base_url: http://localhost:8000\n", "  transport: simulated\n");
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.sap.transport, SapTransportKind::Simulated);
        assert!(config.validate().is_ok());

        let mut gateway = config.clone();
        gateway.sap.transport = SapTransportKind::Gateway;
        assert!(gateway.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_key() {
        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.vault.key_hex = "abcd".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_sap_host() {
        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.sap.ashost = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sap.ashost"));
    }
}
