use super::{DISPLAY_X, DISPLAY_Y, Frame};

/// 64x32 monochrome framebuffer with XOR sprite drawing.
#[derive(Clone)]
pub struct Display {
    pixels: Frame,
}

impl Display {
    pub fn new() -> Self {
        Self {
            pixels: [[false; DISPLAY_X]; DISPLAY_Y],
        }
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_X]; DISPLAY_Y];
    }

    /// XORs an 8-pixel-wide sprite onto the display with its top-left corner at (`x`, `y`).
    ///
    /// Each byte of `rows` is one sprite row, most significant bit leftmost. Pixels
    /// past the right or bottom edge wrap around to the opposite edge.
    /// Returns true if any pixel was turned off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut any_erased = false;

        for (row, sprite_byte) in rows.iter().enumerate() {
            let py = (y as usize + row) % DISPLAY_Y;

            for col in 0..8 {
                // If current sprite bit is non-zero
                if (sprite_byte & (0x80 >> col)) != 0 {
                    let px = (x as usize + col) % DISPLAY_X;
                    let pixel = &mut self.pixels[py][px];

                    // Flip the pixel
                    *pixel ^= true;

                    if !*pixel {
                        any_erased = true;
                    }
                }
            }
        }

        any_erased
    }

    pub fn frame(&self) -> &Frame {
        &self.pixels
    }

    /// Copies the current pixels out for handoff to another owner.
    pub fn snapshot(&self) -> Frame {
        self.pixels
    }

    #[cfg(test)]
    pub(crate) fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
