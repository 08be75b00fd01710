//! Rowcast HTTP API module
//!
//! REST surface for the overlay front-end and the downstream broadcast tool.
//! Run with `rowcast-server`.

pub mod handlers;
pub mod server;

pub use server::run_api_server;
