// HTTP client construction for the gateway.
//
// Every request of one session goes through the same client so the
// session cookie set by login is replayed on resource calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;
use reqwest::cookie::Jar;

use crate::error::Error;

const USER_AGENT: &str = concat!("inventrack/", env!("CARGO_PKG_VERSION"));

/// How server certificates are checked. Mirrors core's `TlsVerification`.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    #[default]
    System,
    /// Trust the PEM bundle at this path in addition to the system roots.
    CustomCa(PathBuf),
    /// Skip verification entirely. Local development servers only.
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Session cookie store. `ApiClient::new` installs a fresh one when unset.
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);
        let mut builder = apply_tls(builder, &self.tls)?;

        if let Some(jar) = &self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot build HTTP client: {e}")))
    }

    /// Same config, with an empty cookie jar attached.
    #[must_use]
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

fn apply_tls(builder: ClientBuilder, mode: &TlsMode) -> Result<ClientBuilder, Error> {
    match mode {
        TlsMode::System => Ok(builder),
        TlsMode::CustomCa(path) => {
            let pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("cannot read CA bundle {}: {e}", path.display())))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Tls(format!("CA bundle {} is not valid PEM: {e}", path.display())))?;
            Ok(builder.add_root_certificate(cert))
        }
        TlsMode::DangerAcceptInvalid => Ok(builder.danger_accept_invalid_certs(true)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_ca_bundle_is_a_tls_error() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/inventrack-ca.pem")),
            ..TransportConfig::default()
        };
        let err = config.build_client().unwrap_err();
        assert!(matches!(err, Error::Tls(msg) if msg.contains("inventrack-ca.pem")));
    }

    #[test]
    fn cookie_jar_is_opt_in() {
        let config = TransportConfig::default();
        assert!(config.cookie_jar.is_none());
        assert!(config.with_cookie_jar().cookie_jar.is_some());
    }
}
