//! HTTP API: routing, request/response mapping and application wiring.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
