//! Shared fixtures for the integration tests: a scripted upgrade server and
//! an in-memory transport.

#![allow(dead_code)]

mod server;
mod transport;

pub use server::{Captured, Script, TestServer};
pub use transport::MockTransport;
