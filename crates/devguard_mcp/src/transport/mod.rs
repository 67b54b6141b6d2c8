//! The three transports this server offers; each is a thin adapter calling
//! the same [`crate::dispatch::dispatch`].

pub mod http;
pub mod sse;
pub mod stdio;
