//! RFC transport abstraction
//!
//! A transport opens logged-on connections to an SAP system; a connection
//! invokes function modules by name with JSON-marshaled parameters.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use super::error::RfcError;
use crate::config::SapConfig;
use crate::vault::SapCredential;

/// Import/export parameter set of one function call, keyed by ABAP parameter name
pub type RfcParams = serde_json::Map<String, serde_json::Value>;

/// Logon parameters for one connection
#[derive(Clone)]
pub struct ConnectionParams {
    pub ashost: String,
    pub sysnr: String,
    pub client: String,
    pub lang: String,
    pub user: String,
    pub passwd: Zeroizing<String>,
}

impl ConnectionParams {
    pub fn new(system: &SapConfig, credential: &SapCredential) -> Self {
        Self {
            ashost: system.ashost.clone(),
            sysnr: system.sysnr.clone(),
            client: system.client.clone(),
            lang: system.lang.clone(),
            user: credential.principal().to_string(),
            passwd: Zeroizing::new(credential.secret().to_string()),
        }
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("ashost", &self.ashost)
            .field("sysnr", &self.sysnr)
            .field("client", &self.client)
            .field("lang", &self.lang)
            .field("user", &self.user)
            .field("passwd", &"***")
            .finish()
    }
}

#[async_trait]
pub trait RfcTransport: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &'static str;

    async fn open(&self, params: &ConnectionParams) -> Result<Box<dyn RfcConnection>, RfcError>;
}

#[async_trait]
pub trait RfcConnection: Send + Sync {
    /// Round trip without business logic (`RFC_PING`)
    async fn ping(&self) -> Result<(), RfcError>;

    async fn invoke(&self, function: &str, params: RfcParams) -> Result<RfcParams, RfcError>;

    async fn close(&self);
}
