//! A CHIP-8 interpreter engine.
//!
//! [`Interpreter`] owns memory, registers, timers, the call stack, the framebuffer and
//! the keypad latch. Hosts drive it one cycle at a time and talk to it through the
//! traits in [`host`].

pub mod display;
pub mod error;
pub mod font;
pub mod host;
pub mod instruction;
pub mod interpreter;
pub mod state;

pub use display::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Framebuffer};
pub use error::Chip8Error;
pub use instruction::{Instruction, decode};
pub use interpreter::Interpreter;
pub use state::{Config, NUM_KEYS};
