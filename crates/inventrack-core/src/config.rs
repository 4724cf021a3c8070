// ── Runtime client configuration ──
//
// Describes *how* to reach the InvenTrack API and where to keep cached
// snapshots. Never touches config files: the CLI builds a `ClientConfig`
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use inventrack_api::{TlsMode, TransportConfig};
use url::Url;

use crate::loader::LoaderPolicy;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for one API endpoint and its local cache.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://inventory.example.com/api/`.
    pub api_url: Url,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Directory for persisted store snapshots. `None` keeps them in memory.
    pub storage_dir: Option<PathBuf>,
    pub loader_policy: LoaderPolicy,
}

impl ClientConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            storage_dir: None,
            loader_policy: LoaderPolicy::default(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_API_URL).expect("default API URL is valid"))
    }
}
