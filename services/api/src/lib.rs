//! Big/Small API Library Crate
//!
//! Configuration, shared state, routing and the WebSocket game sessions. The
//! `api` binary is a thin wrapper around this library.

pub mod config;
pub mod router;
pub mod state;
pub mod ws;
