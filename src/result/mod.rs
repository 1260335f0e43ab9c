//! Uniform result contract
//!
//! - `Promise`: single-assignment outcome cell (pending -> settled)
//! - `AsyncResult`: what every database operation returns
//! - `RequestContext`: opaque caller token threaded into listeners

mod async_result;
mod context;
mod promise;

pub use async_result::AsyncResult;
pub use context::RequestContext;
pub use promise::{Abandon, Completer, Promise};
