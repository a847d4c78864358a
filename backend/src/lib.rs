//! AuthGate Backend Library
//!
//! Session authentication core (credential store, token codec, session
//! registry, engine) plus its HTTP adapter.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
