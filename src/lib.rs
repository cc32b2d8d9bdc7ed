pub mod emu;
mod nibble;

pub use nibble::*;
