use std::path::PathBuf;

/// Result type for CHIP-8 CPU cycle execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Result {
    /// Continue executing instructions in the current frame.
    Continue,
    /// Wait for the next frame before continuing
    /// (e.g. while Fx0A is blocked on a key, or after a draw when `display_wait` is set).
    WaitForNextFrame,
}

/// Error types that can occur during CHIP-8 emulation
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("Failed to read ROM file {}", .path.display())]
    RomIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("Unsupported opcode {opcode:#06X} at PC {pc:#05X}")]
    UnsupportedOpcode { opcode: u16, pc: u16 },

    #[error("Stack overflow: opcode {opcode:#06X} at PC {pc:#05X} exceeded 16 nested calls")]
    StackOverflow { opcode: u16, pc: u16 },

    #[error("Stack underflow: opcode {opcode:#06X} at PC {pc:#05X} returned with an empty call stack")]
    StackUnderflow { opcode: u16, pc: u16 },

    #[error("CPU rate must be a finite number of Hz in (0, {max}], got {cpu_hz}")]
    InvalidCpuRate { cpu_hz: f32, max: f32 },

    #[error("Memory access out of range at address {address:#06X} (PC {pc:#05X})")]
    AddressOutOfRange { address: u16, pc: u16 },
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;

/// A type alias for a buffer with one cell per display pixel
pub type Grid<T> = [[T; DISPLAY_X]; DISPLAY_Y];

/// A read-only copy of the display handed to the renderer.
pub type Frame = Grid<bool>;
