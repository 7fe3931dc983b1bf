use crate::error::{Error, NOT_LEADER_SENTINEL};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Success envelope: every 200 response wraps its payload in `{"data": T}`.
#[derive(Debug, Deserialize)]
struct OkEnvelope<T> {
    data: T,
}

/// Error envelope returned with any non-200 status.
#[derive(Debug, Deserialize)]
struct ErrEnvelope {
    #[serde(default)]
    err: String,
    #[serde(default)]
    msg: String,
}

/// Per-node HTTP client: a reqwest client pinned to one base URL.
#[derive(Debug, Clone)]
pub struct Rest {
    base_url: String,
    client: reqwest::Client,
}

impl Rest {
    pub fn new(base_url: String, request_timeout: Duration, connect_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .expect("failed to build coordinator HTTP client");

        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Hand out a fresh per-request handle. Cheap: reqwest clients are
    /// reference-counted, so this is what request closures receive on every
    /// retry attempt.
    pub fn requester(&self) -> Requester {
        Requester {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
        }
    }
}

/// One logical request against a node.
///
/// Paths are relative (`api/sys/nconf`, `api/v1/sessions/...`) and joined
/// with the node's base URL. All verbs decode the uniform success/error
/// envelope and classify the outcome:
///
/// - no response at all → [`Error::Transport`] (retryable)
/// - non-200 whose `err` contains the not-leader sentinel → [`Error::NotLeader`]
/// - any other non-200 → [`Error::Server`]
/// - 200 with an undecodable body → [`Error::Decode`]
#[derive(Debug, Clone)]
pub struct Requester {
    base_url: String,
    client: reqwest::Client,
}

impl Requester {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.dispatch(self.client.get(self.url(path))).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.dispatch(self.client.post(self.url(path)).json(body))
            .await
    }

    /// POST with the default `{}` body, for endpoints that take no payload.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.post(path, &serde_json::json!({})).await
    }

    /// GET where success is just a 200; the body is not interpreted.
    pub async fn get_ok(&self, path: &str) -> Result<(), Error> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(Error::transport)?;
        let status = resp.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = resp.bytes().await.map_err(Error::transport)?;
        Err(classify_error(status, &body))
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, Error> {
        let resp = req.send().await.map_err(Error::transport)?;
        let status = resp.status();
        // A failure while reading the body is as much an I/O failure as a
        // refused connection.
        let body = resp.bytes().await.map_err(Error::transport)?;

        if status != StatusCode::OK {
            return Err(classify_error(status, &body));
        }

        let envelope: OkEnvelope<T> =
            serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}

/// Map a non-200 response to its error kind. The not-leader sentinel is the
/// only retryable server answer; an undecodable error envelope degrades to a
/// bare status-only server error.
fn classify_error(status: StatusCode, body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrEnvelope>(body) {
        Ok(envelope) if envelope.err.contains(NOT_LEADER_SENTINEL) => Error::NotLeader,
        Ok(envelope) => Error::Server {
            status: status.as_u16(),
            err: envelope.err,
            msg: envelope.msg,
        },
        Err(_) => Error::Server {
            status: status.as_u16(),
            err: String::new(),
            msg: String::new(),
        },
    }
}
