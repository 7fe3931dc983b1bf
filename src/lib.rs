//! Cluster-aware client for a replicated transaction coordinator.
//!
//! The coordinator runs as a replica set in which exactly one node — the
//! leader — accepts writes. This crate gives applications a single logical
//! endpoint over the whole set: it discovers the members from a multi-host
//! URI, locates the leader, routes every request to it, and rides out
//! leader changes and node failures with a single-flight cluster reload and
//! a bounded retry loop.
//!
//! ```no_run
//! use txcoord_client::{Client, ParticipantJoin};
//!
//! # async fn example() -> Result<(), txcoord_client::Error> {
//! let client = Client::connect("http://coord-1:8000,coord-2:8000,coord-3:8000").await?;
//!
//! let session = client.start_session().await?;
//! let participant = client
//!     .join_session(
//!         &session.id,
//!         &ParticipantJoin {
//!             client_id: "svc-payments".into(),
//!             request_id: "order-1842".into(),
//!         },
//!     )
//!     .await?;
//! client.commit_session(&session.id).await?;
//! # let _ = participant;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod conn;
pub mod error;
pub mod rest;

pub use client::{Client, Participant, ParticipantAction, ParticipantCommit, ParticipantJoin, Session};
pub use conn::{ClusterConfig, ConnString, ConnectOptions, Connection, Node, NodeConfig, RetryPolicy};
pub use error::Error;
