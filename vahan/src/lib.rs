//! Vahan - terminal client for the Vahan document chat service.
//!
//! The library holds everything except argument parsing and rendering:
//! - `storage`: durable key/value store for the token, auth snapshot and histories
//! - `api`: HTTP client for login, documents and metrics
//! - `state`: auth, document and metrics slices with their actions
//! - `chat`: session lifecycle over a websocket

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
