//! Merlion Gifts admin console library.
//!
//! This crate provides the admin console functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! Sessions here carry a backend token with admin privileges. The console
//! adds SameSite=Strict sessions and a strict CSP, not network-level
//! protection; deploy it behind a private network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod scaffold;
pub mod state;
