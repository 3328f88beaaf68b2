pub mod events;
pub mod payload;

pub use events::*;
pub use payload::*;
