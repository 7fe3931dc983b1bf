use serde::{Deserialize, Serialize};

/// One node's self-reported identity, as served by `GET /api/sys/nconf`.
/// Both fields are opaque server-side identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Host")]
    pub host: String,
}

/// The replica-set view served by `GET /api/sys/rsconf`: member list and the
/// current leader, if the cluster has one. A snapshot of the server's view
/// at fetch time — stale as soon as it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(rename = "RsName")]
    pub rs_name: String,
    #[serde(rename = "Nodes", default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(rename = "Leader", default)]
    pub leader: Option<NodeConfig>,
}
