//! Keydesk - self-hosted license key issuing and verification server
//!
//! This library provides the core functionality for Keydesk: the software
//! catalog, the license key registry, admin credential handling, bearer-token
//! auth, and the HTTP API handlers on top of a pluggable storage layer.

pub mod catalog;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod state;
pub mod store;
pub mod token;
