use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised while bringing a node onto the network.
///
/// Only startup paths return these. Once a node is running, send failures and
/// bad datagrams are logged and dropped instead.
#[derive(Debug)]
pub enum PatchError {
    /// A socket could not be bound to its address
    Bind { addr: String, source: io::Error },
    /// Any other socket or file error
    Io(io::Error),
    /// Settings could not be loaded or are inconsistent
    Config(String),
    /// The node name has no entry in the unicast port map
    UnknownPeer(String),
    /// The transport was already closed
    Closed,
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::Bind { addr, source } => write!(f, "failed to bind {}: {}", addr, source),
            PatchError::Io(e) => write!(f, "I/O error: {}", e),
            PatchError::Config(msg) => write!(f, "configuration error: {}", msg),
            PatchError::UnknownPeer(name) => {
                write!(f, "node '{}' has no port in the peer map", name)
            }
            PatchError::Closed => write!(f, "transport is closed"),
        }
    }
}

impl Error for PatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PatchError::Bind { source, .. } => Some(source),
            PatchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PatchError {
    fn from(e: io::Error) -> Self {
        PatchError::Io(e)
    }
}

impl From<config::ConfigError> for PatchError {
    fn from(e: config::ConfigError) -> Self {
        PatchError::Config(e.to_string())
    }
}

/// Result type for node and transport setup
pub type Result<T> = std::result::Result<T, PatchError>;
