//! Wine cellar inventory client
//!
//! Typed access to the cellar REST backend plus the client-side rules the
//! dashboard applies before talking to it: stock movement projection,
//! low-stock classification, form validation and session state.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use auth::{AuthService, AuthState, SessionHandle};
pub use client::ApiClient;
pub use config::{load_config, ClientConfig};
pub use errors::ServiceError;
