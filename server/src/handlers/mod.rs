//! Request handlers.

mod agenda;
mod properties;
mod sessions;
mod websocket;

pub use agenda::*;
pub use properties::*;
pub use sessions::*;
pub use websocket::*;
