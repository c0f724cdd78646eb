//! Database module for PostgreSQL persistence.

mod agenda;
mod media;
mod pool;
mod properties;
mod settings;

pub use agenda::*;
pub use media::*;
pub use pool::*;
pub use properties::*;
pub use settings::*;
