pub mod conn_string;
pub mod node;
pub mod types;

pub use conn_string::ConnString;
pub use node::Node;
pub use types::{ClusterConfig, NodeConfig};

use crate::error::Error;
use crate::rest::Requester;
use arc_swap::ArcSwapOption;
use futures_util::stream::{self, StreamExt};
use rand::Rng;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// How many unavailable nodes are probed at once during a reload.
const INIT_CONCURRENCY: usize = 4;

/// Retry schedule for the request loop: exponential backoff from
/// `base_delay`, doubling per retry, capped at `max_delay`, with up to 10%
/// random jitter on top.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry attempt `retry` (1-based).
    fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);
        delay + delay.mul_f64(rand::thread_rng().gen_range(0.0..0.1))
    }
}

/// Construction-time knobs. Timeouts apply to every node's HTTP client;
/// there is no per-call override.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome slot of an in-flight reload: `None` while running, `Some` once
/// complete. Carried inside the watch channel so every waiter reads the
/// outcome of the reload it actually waited on.
type LoadOutcome = Option<Result<(), Error>>;

#[derive(Default)]
struct LoadState {
    leader: Option<Arc<Node>>,
    /// Present exactly while a reload is in flight.
    inflight: Option<watch::Receiver<LoadOutcome>>,
    last_error: Option<Error>,
}

/// Clears the in-flight handle if the reload owner unwinds (panic or task
/// cancellation) before completing, so waiters can take over instead of
/// parking on a channel nobody will ever signal.
struct ReloadGuard<'a> {
    conn: &'a Connection,
    armed: bool,
}

impl Drop for ReloadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.conn.state.lock().unwrap().inflight = None;
        }
    }
}

enum LoadEntry {
    Wait(watch::Receiver<LoadOutcome>),
    Own(watch::Sender<LoadOutcome>),
}

/// Cluster-aware connection: one logical endpoint over a fixed set of
/// coordinator nodes.
///
/// The node list is built from the connection string and never changes;
/// what changes is each node's availability, the cluster view, and the
/// leader pointer. All writes go through [`Connection::request`], which
/// routes to the current leader and transparently rides out leader changes
/// and node failures.
///
/// Constructing a connection performs no I/O; call [`Connection::connect`]
/// to discover the cluster.
pub struct Connection {
    conn_str: ConnString,
    nodes: Vec<Arc<Node>>,
    retry: RetryPolicy,
    /// Lock-free snapshot of the last fetched cluster view.
    rsconf: ArcSwapOption<ClusterConfig>,
    /// Leader pointer + single-flight reload state. Critical sections are
    /// short and never hold the lock across an await.
    state: Mutex<LoadState>,
}

impl Connection {
    pub fn new(uri: &str) -> Result<Self, Error> {
        Self::with_options(uri, ConnectOptions::default())
    }

    pub fn with_options(uri: &str, options: ConnectOptions) -> Result<Self, Error> {
        let conn_str = ConnString::parse(uri)?;
        let nodes = conn_str
            .hosts()
            .iter()
            .map(|host| {
                Arc::new(Node::new(
                    conn_str.base_url(host),
                    options.request_timeout,
                    options.connect_timeout,
                ))
            })
            .collect();

        Ok(Self {
            conn_str,
            nodes,
            retry: options.retry,
            rsconf: ArcSwapOption::empty(),
            state: Mutex::new(LoadState::default()),
        })
    }

    pub fn conn_string(&self) -> &ConnString {
        &self.conn_str
    }

    /// The configured nodes, in connection-string order. Their availability
    /// and identity are snapshots that any later reload may change.
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// Last successfully fetched cluster view, if any.
    pub fn cluster_config(&self) -> Option<Arc<ClusterConfig>> {
        self.rsconf.load_full()
    }

    /// Error of the most recent completed reload, `None` after a success.
    pub fn last_error(&self) -> Option<Error> {
        self.state.lock().unwrap().last_error.clone()
    }

    /// Discover the cluster and locate the leader. Equivalent to one
    /// [`Connection::load_cluster`] pass.
    pub async fn connect(&self) -> Result<(), Error> {
        self.load_cluster().await
    }

    /// Current leader, if any. When a reload is in flight this waits for it
    /// to finish; the handle is snapshotted under the lock and awaited
    /// outside it, so a handle swapped by a later reload cannot be missed.
    pub async fn leader(&self) -> Option<Arc<Node>> {
        let inflight = self.state.lock().unwrap().inflight.clone();
        if let Some(mut rx) = inflight {
            let _ = rx.wait_for(Option::is_some).await;
        }
        self.state.lock().unwrap().leader.clone()
    }

    /// Produce a fresh (cluster view, leader) pair.
    ///
    /// Single-flight: at most one reload runs at a time. A caller that
    /// finds one already in flight waits on it and shares its outcome, so a
    /// burst of callers observing the same leader change costs the cluster
    /// exactly one discovery pass.
    pub async fn load_cluster(&self) -> Result<(), Error> {
        loop {
            let entry = {
                let mut state = self.state.lock().unwrap();
                match state.inflight.clone() {
                    Some(rx) => LoadEntry::Wait(rx),
                    None => {
                        // This caller owns the reload. Drop the stale view
                        // up front so nothing routes to the old leader
                        // while discovery runs.
                        self.rsconf.store(None);
                        state.leader = None;
                        let (tx, rx) = watch::channel(None);
                        state.inflight = Some(rx);
                        LoadEntry::Own(tx)
                    }
                }
            };

            match entry {
                LoadEntry::Wait(mut rx) => match rx.wait_for(Option::is_some).await {
                    Ok(outcome) => return (*outcome).clone().unwrap_or(Ok(())),
                    // Owner unwound before completing; race to take over.
                    Err(_) => continue,
                },
                LoadEntry::Own(tx) => {
                    let mut guard = ReloadGuard {
                        conn: self,
                        armed: true,
                    };

                    let result = self.reload().await;

                    {
                        let mut state = self.state.lock().unwrap();
                        state.inflight = None;
                        match &result {
                            Ok((rsconf, leader)) => {
                                self.rsconf.store(Some(Arc::new(rsconf.clone())));
                                state.leader = Some(leader.clone());
                                state.last_error = None;
                            }
                            Err(err) => state.last_error = Some(err.clone()),
                        }
                    }
                    guard.armed = false;

                    let outcome = result.map(|_| ());
                    let _ = tx.send(Some(outcome.clone()));
                    return outcome;
                }
            }
        }
    }

    /// One discovery pass: revive unavailable nodes, fetch the cluster view
    /// from the first node that will serve it, and match the reported
    /// leader against the configured nodes.
    async fn reload(&self) -> Result<(ClusterConfig, Arc<Node>), Error> {
        self.init_nodes().await;

        let mut rsconf = None;
        for node in &self.nodes {
            if !node.is_available() {
                continue;
            }
            match node.rsconf().await {
                Ok(conf) => {
                    rsconf = Some(conf);
                    break;
                }
                Err(err) => {
                    warn!(
                        "conn: reload: rsconf fetch failed, node={}, err={}",
                        node.base_url(),
                        err
                    );
                }
            }
        }

        let rsconf = rsconf.ok_or(Error::NoNodeAvailable)?;
        let leader_conf = rsconf.leader.clone().ok_or(Error::NoLeader)?;

        // The leader must be one of the configured nodes, matched on the
        // full (id, host) identity pair.
        let leader = self
            .nodes
            .iter()
            .find(|node| {
                node.is_available() && node.config().is_some_and(|conf| conf == leader_conf)
            })
            .cloned()
            .ok_or(Error::LeaderNotInConnString)?;

        debug!(
            "conn: reload: leader located, leader={}, rs={}",
            leader.base_url(),
            rsconf.rs_name
        );

        Ok((rsconf, leader))
    }

    /// Probe every unavailable node's identity, bounded fan-out. Individual
    /// failures are logged and swallowed: one dead node must not block
    /// discovery through the others.
    async fn init_nodes(&self) {
        stream::iter(self.nodes.iter().filter(|node| !node.is_available()))
            .for_each_concurrent(INIT_CONCURRENCY, |node| async move {
                if let Err(err) = node.init().await {
                    warn!(
                        "conn: reload: node init failed, node={}, err={}",
                        node.base_url(),
                        err
                    );
                }
            })
            .await;
    }

    /// Run a request closure against the current leader, reloading the
    /// cluster and retrying on transient failures (dead connection, stale
    /// leader pointer). Non-retryable errors return immediately; after
    /// `max_retries` the last transient error is surfaced as-is.
    ///
    /// The closure may run more than once, so the operation it performs
    /// must be idempotent at the server or acceptable to re-execute.
    pub async fn request<T, F, Fut>(&self, f: F) -> Result<T, Error>
    where
        F: Fn(Requester) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut result = self.attempt(&f).await;

        let mut retries = 0;
        while retries < self.retry.max_retries
            && result.as_ref().err().is_some_and(Error::is_retryable)
        {
            // The leader pointer is stale or the node is gone; refresh the
            // view before trying again. A failed reload ends the request.
            self.load_cluster().await?;

            retries += 1;
            debug!("conn: request retry, attempt={}", retries);
            tokio::time::sleep(self.retry.backoff(retries)).await;
            result = self.attempt(&f).await;
        }

        result
    }

    async fn attempt<T, F, Fut>(&self, f: &F) -> Result<T, Error>
    where
        F: Fn(Requester) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        match self.leader().await {
            Some(leader) => leader.request(f).await,
            // Treated as retryable: a reload may produce a leader.
            None => Err(Error::NotLeader),
        }
    }
}
