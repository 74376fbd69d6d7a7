use bitvec::{BitArr, array::BitArray};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

pub type Pixels = BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT);

/// Monochrome 64x32 pixel grid, row-major, plus a dirty flag for the renderer.
///
/// The dirty flag is set by every mutation and only cleared by [`Framebuffer::acknowledge`].
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: Pixels,
    dirty: bool,
}

impl Framebuffer {
    /// A blank grid that is already due for a render, so the first frame draws it.
    pub fn new() -> Self {
        Framebuffer {
            pixels: BitArray::ZERO,
            dirty: true,
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
        self.dirty = true;
    }

    /// XORs `sprite` into the grid with its top-left corner at (`x`, `y`).
    ///
    /// Each byte is one 8-pixel row, most significant bit leftmost. The origin wraps
    /// onto the grid but the sprite itself is clipped at the right and bottom edges.
    /// Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let x = x % DISPLAY_WIDTH;
        let y = y % DISPLAY_HEIGHT;
        let mut collision = false;

        for (row, &byte) in sprite.iter().enumerate() {
            let pixel_y = y + row;
            if pixel_y >= DISPLAY_HEIGHT {
                break;
            }
            for bit in 0..8 {
                let pixel_x = x + bit;
                if pixel_x >= DISPLAY_WIDTH {
                    break;
                }

                if (byte >> (7 - bit)) & 1 == 0 {
                    continue;
                }

                let index = pixel_y * DISPLAY_WIDTH + pixel_x;
                let current_pixel = self.pixels[index];
                if current_pixel {
                    collision = true;
                }
                self.pixels.set(index, !current_pixel);
            }
        }

        self.dirty = true;
        collision
    }

    /// Out-of-grid coordinates read as unlit.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return false;
        }
        self.pixels[y * DISPLAY_WIDTH + x]
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.count_ones()
    }

    /// Iterates over the grid one row at a time.
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = bool> + '_> + '_ {
        (0..DISPLAY_HEIGHT).map(move |y| (0..DISPLAY_WIDTH).map(move |x| self.pixel(x, y)))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn acknowledge(&mut self) {
        self.dirty = false;
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("lit", &self.lit_count())
            .field("dirty", &self.dirty)
            .finish()
    }
}
