//! Error types for network-config-rs.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving network configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// A request URL could not be parsed as an absolute URL.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A configured proxy URL could not be parsed.
    ///
    /// The most common cause is a username or password containing raw
    /// `:`, `@` or other reserved characters; those must be
    /// percent-encoded in the proxy URL.
    #[error(
        "couldn't parse proxy URL '{url}': {source}. \
         If the proxy URL contains a username or password, make sure they are percent-encoded"
    )]
    InvalidProxyUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Failed to read a certificate or key file referenced by config.
    #[error("failed to read file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for network-config-rs operations.
pub type Result<T> = std::result::Result<T, Error>;
