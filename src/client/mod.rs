pub mod schema;

pub use schema::{Participant, ParticipantAction, ParticipantCommit, ParticipantJoin, Session};

use crate::conn::{ConnectOptions, Connection};
use crate::error::Error;
use std::sync::Arc;

const V1_SESSIONS_PATH: &str = "api/v1/sessions";

/// Typed client for the coordinator's session/participant API.
///
/// A thin layer over [`Connection::request`]: every operation maps
/// one-to-one onto an HTTP endpoint and decodes the standard envelope.
/// Leader routing, failover, and retries all live in the connection —
/// nothing here retries on its own.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct Client {
    conn: Arc<Connection>,
}

impl Client {
    /// Build a connection from `uri` and discover the cluster. An empty
    /// `uri` targets the default local endpoint.
    pub async fn connect(uri: &str) -> Result<Self, Error> {
        Self::with_options(uri, ConnectOptions::default()).await
    }

    pub async fn with_options(uri: &str, options: ConnectOptions) -> Result<Self, Error> {
        let conn = Connection::with_options(uri, options)?;
        conn.connect().await?;
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// The underlying cluster connection, for leader / node inspection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// `POST /api/v1/sessions` — open a new session.
    pub async fn start_session(&self) -> Result<Session, Error> {
        self.conn
            .request(|req| async move { req.post_empty(V1_SESSIONS_PATH).await })
            .await
    }

    /// `GET /api/v1/sessions/{id}` — fetch an existing session.
    pub async fn session_from_id(&self, session_id: &str) -> Result<Session, Error> {
        let path = format!("{}/{}", V1_SESSIONS_PATH, session_id);
        self.conn
            .request(|req| {
                let path = path.as_str();
                async move { req.get(path).await }
            })
            .await
    }

    /// `POST /api/v1/sessions/{id}/join` — enroll a participant. The
    /// coordinator deduplicates on `request_id`, which is what makes the
    /// connection-level retry of this call safe.
    pub async fn join_session(
        &self,
        session_id: &str,
        body: &ParticipantJoin,
    ) -> Result<Participant, Error> {
        let path = format!("{}/{}/join", V1_SESSIONS_PATH, session_id);
        self.conn
            .request(|req| {
                let path = path.as_str();
                async move { req.post(path, body).await }
            })
            .await
    }

    /// `POST /api/v1/sessions/{id}/partial-commit` — record a participant's
    /// compensate/complete actions.
    pub async fn partial_commit(
        &self,
        session_id: &str,
        body: &ParticipantCommit,
    ) -> Result<Participant, Error> {
        let path = format!("{}/{}/partial-commit", V1_SESSIONS_PATH, session_id);
        self.conn
            .request(|req| {
                let path = path.as_str();
                async move { req.post(path, body).await }
            })
            .await
    }

    /// `POST /api/v1/sessions/{id}/commit` — commit the whole session.
    pub async fn commit_session(&self, session_id: &str) -> Result<Session, Error> {
        let path = format!("{}/{}/commit", V1_SESSIONS_PATH, session_id);
        self.conn
            .request(|req| {
                let path = path.as_str();
                async move { req.post_empty(path).await }
            })
            .await
    }

    /// `POST /api/v1/sessions/{id}/abort` — abort the session; the
    /// coordinator runs the recorded compensations.
    pub async fn abort_session(&self, session_id: &str) -> Result<Session, Error> {
        let path = format!("{}/{}/abort", V1_SESSIONS_PATH, session_id);
        self.conn
            .request(|req| {
                let path = path.as_str();
                async move { req.post_empty(path).await }
            })
            .await
    }
}
