#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Domain models, the session-token lifecycle (issue, authenticate, revoke),"]
#![doc = "account flows, persistence and routing for the Taskdesk API."]
#![doc = "The binary (`main.rs`) only loads configuration, connects the store and"]
#![doc = "starts the server with [`state::AppState::configure`]."]

pub mod accounts;
pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
