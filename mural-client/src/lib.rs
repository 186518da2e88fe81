//! Terminal client of the distributed mural.
//!
//! Logs in on one or more nodes, posts and reads messages, and keeps a live
//! view of every node's status through periodic sweeps of their HTTP
//! endpoints.

pub mod app;
pub mod auth;
pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod messaging;
pub mod network;
pub mod status;
pub mod ui;

pub use client::{MuralClient, SessionBook};
pub use error::{ApiError, ClientError};
pub use network::NodeApi;
