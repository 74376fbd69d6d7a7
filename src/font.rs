use crate::state::{Address, PC_START_ADDR};

pub const GLYPH_HEIGHT: usize = 5;
pub const GLYPH_COUNT: usize = 16;

/// The font table sits immediately below the program area, ending at 0x200.
pub const FONT_ADDR: Address = PC_START_ADDR - GLYPH_COUNT * GLYPH_HEIGHT;

/// A 5-row bitmap for one hexadecimal digit. Only the high nibble of each row is lit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSprite([u8; GLYPH_HEIGHT]);

impl FontSprite {
    pub const ZERO: FontSprite = FontSprite([0xF0, 0x90, 0x90, 0x90, 0xF0]);
    pub const ONE: FontSprite = FontSprite([0x20, 0x60, 0x20, 0x20, 0x70]);
    pub const TWO: FontSprite = FontSprite([0xF0, 0x10, 0xF0, 0x80, 0xF0]);
    pub const THREE: FontSprite = FontSprite([0xF0, 0x10, 0xF0, 0x10, 0xF0]);
    pub const FOUR: FontSprite = FontSprite([0x90, 0x90, 0xF0, 0x10, 0x10]);
    pub const FIVE: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x10, 0xF0]);
    pub const SIX: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x90, 0xF0]);
    pub const SEVEN: FontSprite = FontSprite([0xF0, 0x10, 0x20, 0x40, 0x40]);
    pub const EIGHT: FontSprite = FontSprite([0xF0, 0x90, 0xF0, 0x90, 0xF0]);
    pub const NINE: FontSprite = FontSprite([0xF0, 0x90, 0xF0, 0x10, 0xF0]);
    pub const A: FontSprite = FontSprite([0xF0, 0x90, 0xF0, 0x90, 0x90]);
    pub const B: FontSprite = FontSprite([0xE0, 0x90, 0xE0, 0x90, 0xE0]);
    pub const C: FontSprite = FontSprite([0xF0, 0x80, 0x80, 0x80, 0xF0]);
    pub const D: FontSprite = FontSprite([0xE0, 0x90, 0x90, 0x90, 0xE0]);
    pub const E: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x80, 0xF0]);
    pub const F: FontSprite = FontSprite([0xF0, 0x80, 0xF0, 0x80, 0x80]);

    /// Glyphs in digit order, 0 through F.
    pub const ALL: [FontSprite; GLYPH_COUNT] = [
        Self::ZERO,
        Self::ONE,
        Self::TWO,
        Self::THREE,
        Self::FOUR,
        Self::FIVE,
        Self::SIX,
        Self::SEVEN,
        Self::EIGHT,
        Self::NINE,
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
    ];

    pub fn as_bytes(&self) -> &[u8; GLYPH_HEIGHT] {
        &self.0
    }
}

/// Address of the glyph for `digit`.
///
/// Values above 0xF are not masked, so they land past the table and into the program area.
pub fn glyph_addr(digit: u8) -> Address {
    FONT_ADDR + usize::from(digit) * GLYPH_HEIGHT
}

/// The whole table laid out as it appears in memory.
pub fn font_bytes() -> [u8; GLYPH_COUNT * GLYPH_HEIGHT] {
    let mut bytes = [0; GLYPH_COUNT * GLYPH_HEIGHT];
    for (chunk, sprite) in bytes.chunks_exact_mut(GLYPH_HEIGHT).zip(FontSprite::ALL) {
        chunk.copy_from_slice(sprite.as_bytes());
    }
    bytes
}
