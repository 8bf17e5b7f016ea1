//! JSON request layer over the supervisor's operations.
//!
//! Every handler parses the request, calls one supervisor or store operation
//! and serializes what comes back.

mod routes;
mod server;

pub use server::{router, serve};
