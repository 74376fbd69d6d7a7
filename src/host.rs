//! Contracts for the collaborators that sit around the interpreter: something that
//! shows the framebuffer, something that plays the tone, and something that reports keys.

use crate::display::Framebuffer;
use crate::state::NUM_KEYS;

pub trait DisplaySink {
    /// Called only when the interpreter reports a render is due.
    fn present(&mut self, frame: &Framebuffer) -> anyhow::Result<()>;
}

pub trait AudioSink {
    fn set_tone(&mut self, active: bool);
}

pub trait InputSource {
    /// Latest pressed/released state of keys 0x0 through 0xF.
    fn poll_keys(&mut self) -> anyhow::Result<[bool; NUM_KEYS]>;
}

/// Audio sink for hosts without sound.
pub struct Silent;

impl AudioSink for Silent {
    fn set_tone(&mut self, _active: bool) {}
}
