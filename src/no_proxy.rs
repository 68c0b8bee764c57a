//! Proxy exclusion rules.
//!
//! The `noproxy` setting is either a global boolean switch or a
//! comma-separated list of domain suffixes that bypass the proxy.

use regex::Regex;
use std::sync::LazyLock;

/// Splits no-proxy entries on commas with surrounding whitespace.
static NO_PROXY_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").unwrap());

/// Hosts excluded from proxying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoProxy {
    /// A global on/off switch, unrelated to the target host.
    Flag(bool),
    /// A comma-separated list of domain suffixes.
    List(String),
}

impl NoProxy {
    /// Check whether a host bypasses the proxy.
    ///
    /// A list entry matches when its dot-separated labels are a suffix
    /// of the host's labels, compared from the TLD end inward. This is
    /// a label-wise suffix match, never a substring match:
    /// `foo.com` matches `sub.foo.com` but not `foo.com.evil.com`.
    pub fn is_excluded(&self, host: &str) -> bool {
        match self {
            NoProxy::Flag(enabled) => *enabled,
            NoProxy::List(list) => {
                let host_labels: Vec<&str> =
                    host.split('.').filter(|label| !label.is_empty()).rev().collect();
                NO_PROXY_SPLIT.split(list).any(|entry| {
                    let entry_labels: Vec<&str> = entry
                        .split('.')
                        .filter(|label| !label.is_empty())
                        .rev()
                        .collect();
                    if entry_labels.is_empty() || entry_labels.len() > host_labels.len() {
                        return false;
                    }
                    entry_labels
                        .iter()
                        .zip(&host_labels)
                        .all(|(entry_label, host_label)| entry_label == host_label)
                })
            }
        }
    }
}

impl From<bool> for NoProxy {
    fn from(enabled: bool) -> Self {
        NoProxy::Flag(enabled)
    }
}

impl From<&str> for NoProxy {
    fn from(list: &str) -> Self {
        NoProxy::List(list.to_string())
    }
}

impl From<String> for NoProxy {
    fn from(list: String) -> Self {
        NoProxy::List(list)
    }
}
