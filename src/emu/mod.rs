mod chip8;
mod config;
mod display;
mod execute;
mod io;
mod keypad;
mod memory;
mod opcode;
mod registers;
mod rom;
mod runner;
mod types;

pub use chip8::*;
pub use config::*;
pub use display::*;
pub use io::*;
pub use keypad::*;
pub use memory::*;
pub use opcode::*;
pub use registers::*;
pub use rom::*;
pub use runner::*;
pub use types::*;
