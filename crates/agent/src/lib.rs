//! `qdesk-agent` library crate.
//!
//! The print agent catches up on pending print jobs, listens for new ones
//! on the server's event stream, claims each job and prints it. Modules are
//! public for integration testing; the binary entrypoint lives in
//! `main.rs`.

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod printer;
pub mod runtime;
pub mod sse;
