//! HTTP Handlers

mod ping;
mod queue;
mod task;
mod websocket;

pub use ping::*;
pub use queue::*;
pub use task::*;
pub use websocket::*;
