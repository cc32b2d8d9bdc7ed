use super::Chip8Error;

// Standard CHIP-8 memory layout
pub const MEMORY_SIZE: usize = 4096;
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - ROM_START_ADDRESS;

pub const FONT_START_ADDRESS: usize = 0x50;
pub const FONT_GLYPH_SIZE: usize = 5;
pub const FONT_END_ADDRESS: usize = FONT_START_ADDRESS + FONT.len();

/// Built-in hex digit glyphs 0-F, each 4 pixels wide and 5 rows tall.
pub const FONT: [u8; 16 * FONT_GLYPH_SIZE] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Raised by any memory access at or beyond `MEMORY_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("address {address:#06X} is outside of memory")]
pub struct AddressOutOfRange {
    pub address: u16,
}

/// 4KB of byte-addressable memory with the font preloaded.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);
        Self { bytes }
    }

    /// Copies a ROM image to `ROM_START_ADDRESS`.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        let rom_end = ROM_START_ADDRESS + rom.len();
        self.bytes
            .get_mut(ROM_START_ADDRESS..rom_end)
            .ok_or(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            })?
            .copy_from_slice(rom);

        Ok(())
    }

    pub fn read(&self, address: u16) -> Result<u8, AddressOutOfRange> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(AddressOutOfRange { address })
    }

    pub fn write(&mut self, address: u16, value: u8) -> Result<(), AddressOutOfRange> {
        let cell = self
            .bytes
            .get_mut(address as usize)
            .ok_or(AddressOutOfRange { address })?;
        *cell = value;
        Ok(())
    }

    /// Reads the big-endian instruction word at `address`.
    pub fn read_word(&self, address: u16) -> Result<u16, AddressOutOfRange> {
        let high = self.read(address)?;
        let low = self.read(address.wrapping_add(1))?;
        Ok(u16::from_be_bytes([high, low]))
    }

    /// Borrows `len` bytes starting at `address`.
    ///
    /// On failure the reported address is the first one past the end of memory.
    pub fn slice(&self, address: u16, len: usize) -> Result<&[u8], AddressOutOfRange> {
        let start = address as usize;
        self.bytes
            .get(start..start + len)
            .ok_or(AddressOutOfRange {
                address: start.max(MEMORY_SIZE) as u16,
            })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
