//! HTTP handlers.

mod health;
mod rpc;
mod sse;

pub use health::health;
pub use rpc::rpc;
pub use sse::{message, sse};
