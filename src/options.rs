//! Agent options and rc-config loading.
//!
//! [`AgentOptions`] is the flat settings object consumed by proxy
//! resolution and agent construction. It can be populated directly or
//! mapped from rc-style config files (the `.npmrc` format), including
//! environment variable expansion and per-registry certificate files.

use crate::certs::ClientCert;
use crate::error::{Error, Result};
use crate::no_proxy::NoProxy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Regex for matching environment variable references: `${VAR}` or `${VAR?}`
/// The `?` modifier makes undefined variables expand to empty string instead
/// of keeping the literal. Supports escaping with backslashes.
static ENV_EXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<esc>\\*)\$\{(?P<name>[^${}?]+)(?P<mod>\?)?\}").unwrap());

/// Settings that drive proxy selection and agent construction.
///
/// The `Debug` implementation redacts the TLS private key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AgentOptions {
    /// Proxy for `http:` targets.
    pub http_proxy: Option<String>,
    /// Proxy for `https:` targets.
    pub https_proxy: Option<String>,
    /// Hosts excluded from proxying.
    pub no_proxy: Option<NoProxy>,
    /// Global certificate authority chain, PEM.
    pub ca: Option<String>,
    /// Global client certificate, PEM.
    pub cert: Option<String>,
    /// Global client private key, PEM.
    pub key: Option<String>,
    /// Whether TLS certificate validation failures abort the connection.
    pub strict_ssl: Option<bool>,
    /// Local interface address to bind outgoing connections to.
    pub local_address: Option<String>,
    /// Socket pool ceiling per agent.
    pub max_sockets: Option<usize>,
    /// Request timeout in milliseconds; 0 or unset disables it.
    pub timeout: Option<u64>,
    /// Per-registry client certificates, keyed by nerf dart.
    pub client_certificates: Option<HashMap<String, ClientCert>>,
}

impl fmt::Debug for AgentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentOptions")
            .field("http_proxy", &self.http_proxy)
            .field("https_proxy", &self.https_proxy)
            .field("no_proxy", &self.no_proxy)
            .field("ca", &self.ca)
            .field("cert", &self.cert)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("strict_ssl", &self.strict_ssl)
            .field("local_address", &self.local_address)
            .field("max_sockets", &self.max_sockets)
            .field("timeout", &self.timeout)
            .field("client_certificates", &self.client_certificates)
            .finish()
    }
}

impl AgentOptions {
    /// Global certificate material as a [`ClientCert`] set.
    pub(crate) fn global_cert(&self) -> ClientCert {
        ClientCert {
            ca: self.ca.clone(),
            cert: self.cert.clone(),
            key: self.key.clone(),
        }
    }

    /// Map rc config keys onto agent options.
    ///
    /// Recognized keys: `proxy`, `http-proxy`, `https-proxy`, `noproxy`,
    /// `ca`, `cert`, `key`, `strict-ssl`, `local-address`, `maxsockets`,
    /// `fetch-timeout`, and per-registry `//host/:certfile`,
    /// `//host/:keyfile`, `//host/:cafile` entries whose file contents
    /// are read from disk (with `~` expansion).
    ///
    /// Numeric values that fail to parse are ignored, matching the
    /// lenient handling of rc files. Missing certificate files fail
    /// with [`Error::ReadFile`].
    pub fn from_config(config: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| config.get(key).map(String::clone);

        let no_proxy = get("noproxy").map(|value| match parse_bool(&value) {
            Some(flag) => NoProxy::Flag(flag),
            None => NoProxy::List(value),
        });

        let client_certificates = collect_client_certificates(config)?;

        Ok(AgentOptions {
            http_proxy: get("http-proxy").or_else(|| get("proxy")),
            https_proxy: get("https-proxy").or_else(|| get("proxy")),
            no_proxy,
            ca: get("ca"),
            cert: get("cert"),
            key: get("key"),
            strict_ssl: config.get("strict-ssl").and_then(|v| parse_bool(v)),
            local_address: get("local-address"),
            max_sockets: config.get("maxsockets").and_then(|v| v.parse().ok()),
            timeout: config.get("fetch-timeout").and_then(|v| v.parse().ok()),
            client_certificates: if client_certificates.is_empty() {
                None
            } else {
                Some(client_certificates)
            },
        })
    }
}

/// Collect `//host/:certfile`-style entries into a per-scope map.
fn collect_client_certificates(
    config: &HashMap<String, String>,
) -> Result<HashMap<String, ClientCert>> {
    let mut certificates: HashMap<String, ClientCert> = HashMap::new();

    for (key, value) in config {
        if !key.starts_with("//") {
            continue;
        }
        let (scope, field) = match key.rsplit_once(':') {
            Some(split) => split,
            None => continue,
        };
        if !scope.ends_with('/') {
            continue;
        }
        if !matches!(field, "cafile" | "certfile" | "keyfile") {
            continue;
        }
        let contents = read_pem_file(value)?;
        let entry = certificates.entry(scope.to_string()).or_default();
        match field {
            "cafile" => entry.ca = Some(contents),
            "certfile" => entry.cert = Some(contents),
            _ => entry.key = Some(contents),
        }
    }

    Ok(certificates)
}

fn read_pem_file(path: &str) -> Result<String> {
    let path = expand_tilde(path);
    std::fs::read_to_string(&path).map_err(|source| Error::ReadFile { path, source })
}

/// Parse rc-format content into key-value pairs.
///
/// The format is a simplified INI: `key = value` lines, comments
/// starting with `#` or `;`, no sections. Keys may start with special
/// characters like `//` (nerf-darted scopes). Values get environment
/// variable expansion applied.
pub fn parse_rc(content: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let value = line[eq_pos + 1..].trim();

            if key.is_empty() {
                continue;
            }

            result.insert(key.to_string(), expand_env_vars(value));
        }
        // Lines without = are ignored, as rc parsers do.
    }

    result
}

/// Expand `${VAR}` environment variable references in a value.
///
/// - `${VAR}` - Expands to the value of VAR, or keeps `${VAR}` literal if undefined
/// - `${VAR?}` - Expands to the value of VAR, or empty string if undefined
/// - `\${VAR}` - Escaped, keeps the literal (with one less backslash)
pub fn expand_env_vars(value: &str) -> String {
    ENV_EXPR
        .replace_all(value, |caps: &regex::Captures| {
            let esc = caps.name("esc").map_or("", |m| m.as_str());
            let name = caps.name("name").map_or("", |m| m.as_str());
            let modifier = caps.name("mod").map_or("", |m| m.as_str());

            let esc_len = esc.len();
            let kept_esc = &esc[..(esc_len / 2)];

            // An odd number of backslashes escapes the $ itself.
            if esc_len % 2 == 1 {
                return format!("{}${{{}{}}}", kept_esc, name, modifier);
            }

            let val = match std::env::var(name) {
                Ok(v) => v,
                Err(_) => {
                    if modifier == "?" {
                        String::new()
                    } else {
                        format!("${{{}}}", name)
                    }
                }
            };

            format!("{}{}", kept_esc, val)
        })
        .into_owned()
}

/// Parse a boolean config value.
///
/// Returns `Some(true)` for "true", `Some(false)` for "false", and
/// `None` for anything else.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
