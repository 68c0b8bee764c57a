//! Client certificate selection for mTLS registries.

use crate::error::Result;
use crate::settings::pick_setting_by_url;
use std::collections::HashMap;
use std::fmt;

/// CA, certificate and key material for a TLS connection.
///
/// All fields are optional; an empty set means the TLS defaults apply.
///
/// The `Debug` implementation redacts the private key to prevent
/// accidental leakage in logs or error messages.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientCert {
    /// Certificate authority chain, PEM.
    pub ca: Option<String>,
    /// Client certificate, PEM.
    pub cert: Option<String>,
    /// Client private key, PEM.
    pub key: Option<String>,
}

impl fmt::Debug for ClientCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCert")
            .field("ca", &self.ca)
            .field("cert", &self.cert)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Select the certificate set for a request URL.
///
/// The per-scope map is resolved with the scoped settings rules; a
/// matching entry overrides the global set field-by-field, so a scoped
/// entry without an explicit `ca` still inherits the global one. With
/// no match the global set is returned unmodified.
pub fn select_client_cert(
    map: Option<&HashMap<String, ClientCert>>,
    uri: &str,
    global: &ClientCert,
) -> Result<ClientCert> {
    let scoped = pick_setting_by_url(map, uri)?;
    Ok(match scoped {
        Some(scoped) => ClientCert {
            ca: scoped.ca.clone().or_else(|| global.ca.clone()),
            cert: scoped.cert.clone().or_else(|| global.cert.clone()),
            key: scoped.key.clone().or_else(|| global.key.clone()),
        },
        None => global.clone(),
    })
}
