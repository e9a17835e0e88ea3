//! Plain static file server for a generated site.

pub mod server;

pub use server::{ServerError, StaticServer};
