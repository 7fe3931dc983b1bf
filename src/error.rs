use std::fmt;
use std::sync::Arc;

/// Substring the coordinator puts in its error envelope when a follower
/// receives a write. Matching is by containment, not equality.
pub(crate) const NOT_LEADER_SENTINEL: &str = "node is not the leader";

/// Every failure the connector can surface.
///
/// The enum is `Clone` so that a single reload outcome can be handed to all
/// callers coalesced behind the same in-flight reload; the transport cause
/// is therefore kept behind an `Arc`.
#[derive(Debug, Clone)]
pub enum Error {
    /// The connection URI could not be parsed at all.
    InvalidUri(String),
    /// URI scheme was something other than `http` or `https`.
    InvalidScheme(String),
    /// URI parsed but contained no hosts.
    EmptyHosts,
    /// The request never produced a response (DNS, connect, I/O, timeout).
    Transport(Arc<reqwest::Error>),
    /// The node answered, but it is no longer the leader.
    NotLeader,
    /// Any other non-200 response with a decodable error envelope.
    Server { status: u16, err: String, msg: String },
    /// A 200 response whose body did not match the expected envelope.
    Decode(String),
    /// A reload found no reachable node that could serve the cluster view.
    NoNodeAvailable,
    /// The cluster view reported no leader.
    NoLeader,
    /// The reported leader is not among the configured hosts.
    LeaderNotInConnString,
}

impl Error {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        Error::Transport(Arc::new(err))
    }

    /// Whether the retry loop should reload the cluster and try again.
    /// Only transient conditions qualify: a dead connection or a stale
    /// leader pointer. Everything else terminates the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::NotLeader)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidUri(msg) => write!(f, "invalid connection uri: {}", msg),
            Error::InvalidScheme(scheme) => {
                write!(f, "scheme must be \"http\" or \"https\", got {:?}", scheme)
            }
            Error::EmptyHosts => write!(f, "connection uri contains no hosts"),
            Error::Transport(e) => write!(f, "transport error: {}", e),
            Error::NotLeader => write!(f, "node is not the leader"),
            Error::Server { status, err, msg } => {
                write!(f, "non 200 status: {}, msg: {}, err: {}", status, msg, err)
            }
            Error::Decode(msg) => write!(f, "malformed response envelope: {}", msg),
            Error::NoNodeAvailable => write!(f, "no node available"),
            Error::NoLeader => write!(f, "cluster has no leader"),
            Error::LeaderNotInConnString => {
                write!(f, "reported leader is not in the connection string")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
