use crate::conn::types::{ClusterConfig, NodeConfig};
use crate::error::Error;
use crate::rest::{Requester, Rest};
use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

const SYS_API_PREFIX: &str = "api/sys";

/// One configured cluster member.
///
/// The base URL comes from the connection string and never changes; the
/// node's identity is whatever `nconf` last reported. A node is *available*
/// exactly when it holds an identity. [`Node::init`] fetches one,
/// [`Node::perish`] drops it — a transport failure on any request perishes
/// the node so the next reload probes it again.
///
/// Identity is read and written concurrently (reload sweep vs. callers
/// snapshotting availability), so it sits behind a lock; the critical
/// sections are tiny and never span an await.
#[derive(Debug)]
pub struct Node {
    base_url: String,
    rest: Rest,
    conf: RwLock<Option<NodeConfig>>,
}

impl Node {
    pub(crate) fn new(
        base_url: String,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        let rest = Rest::new(base_url.clone(), request_timeout, connect_timeout);
        Self {
            base_url,
            rest,
            conf: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Last identity reported by `nconf`, if the node is available.
    pub fn config(&self) -> Option<NodeConfig> {
        self.conf.read().unwrap().clone()
    }

    pub fn is_available(&self) -> bool {
        self.conf.read().unwrap().is_some()
    }

    /// Fetch this node's identity and mark it available. On failure the
    /// node stays (or becomes) unavailable and the error propagates.
    pub(crate) async fn init(&self) -> Result<(), Error> {
        let conf = self.nconf().await?;
        debug!(
            "conn: node initialized, node={}, id={}",
            self.base_url, conf.id
        );
        *self.conf.write().unwrap() = Some(conf);
        Ok(())
    }

    /// Drop the stored identity; the node must be re-`init`ed before the
    /// connection will consult it again.
    pub(crate) fn perish(&self) {
        self.conf.write().unwrap().take();
    }

    /// Run one request against this node's requester.
    ///
    /// A transport failure means the request may never have reached the
    /// node, so the node is perished. A not-leader answer passes through
    /// untouched: the node is alive, it just cannot take writes.
    pub async fn request<T, F, Fut>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(Requester) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let result = f(self.rest.requester()).await;
        if let Err(Error::Transport(_)) = &result {
            self.perish();
        }
        result
    }

    /// Liveness probe: `GET /api/sys/ping`, success is a 200.
    pub async fn ping(&self) -> Result<(), Error> {
        self.request(|req| async move { req.get_ok(&format!("{}/ping", SYS_API_PREFIX)).await })
            .await
    }

    async fn nconf(&self) -> Result<NodeConfig, Error> {
        self.request(|req| async move { req.get(&format!("{}/nconf", SYS_API_PREFIX)).await })
            .await
    }

    /// Fetch the cluster view as this node sees it.
    pub(crate) async fn rsconf(&self) -> Result<ClusterConfig, Error> {
        self.request(|req| async move { req.get(&format!("{}/rsconf", SYS_API_PREFIX)).await })
            .await
    }
}
