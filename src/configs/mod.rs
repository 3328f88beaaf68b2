pub mod base;
pub mod lfg;
pub mod server;

pub use base::*;
pub use lfg::*;
pub use server::*;
