use std::path::Path;

use super::{Chip8Error, MAX_ROM_SIZE};

/// Reads a ROM image from disk, rejecting files that cannot fit in program memory.
pub fn read_rom(path: &Path) -> Result<Vec<u8>, Chip8Error> {
    let rom = std::fs::read(path).map_err(|source| Chip8Error::RomIo {
        path: path.to_path_buf(),
        source,
    })?;

    if rom.len() > MAX_ROM_SIZE {
        return Err(Chip8Error::RomTooLarge {
            size: rom.len(),
            max_size: MAX_ROM_SIZE,
        });
    }

    log::info!("Read ROM {} ({} bytes)", path.display(), rom.len());
    Ok(rom)
}
