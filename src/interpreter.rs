use std::io::Write;
use std::path::Path;

use crate::display::Framebuffer;
use crate::error::Chip8Error;
use crate::host::{AudioSink, DisplaySink, InputSource};
use crate::instruction::{Instruction, decode};
use crate::state::{Chip8State, Config, Register, Timer};

/// The CHIP-8 fetch-decode-execute engine and everything it owns.
///
/// The interpreter is single-threaded and does not pace itself. A host calls
/// [`Interpreter::execute_cycle`] at its chosen rate and serializes every other call
/// with it, or hands [`Interpreter::snapshot`] to whoever draws.
pub struct Interpreter {
    state: Chip8State,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Interpreter {
            state: Chip8State::new(config),
        }
    }

    /// Reads the file at `path` and copies it into memory at 0x200.
    ///
    /// Memory outside the copied range is left alone, and an empty file is accepted.
    /// Returns the number of bytes stored; anything past the end of memory is lost.
    pub fn load_program(&mut self, path: impl AsRef<Path>) -> Result<usize, Chip8Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Chip8Error::ProgramNotFound {
                path: path.to_path_buf(),
            });
        }
        let rom = std::fs::read(path).map_err(|source| Chip8Error::ProgramRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.load_program_bytes(&rom))
    }

    pub fn load_program_bytes(&mut self, rom: &[u8]) -> usize {
        self.state.memory.load_rom(rom)
    }

    /// Runs one fetch-decode-execute step followed by the timer bookkeeping.
    pub fn execute_cycle(&mut self) {
        let instruction = self.fetch_instruction();
        instruction.execute(&mut self.state);
        self.state.timers.on_cycle();
    }

    fn fetch_instruction(&mut self) -> Instruction {
        let raw = self.state.memory.read_word(usize::from(self.state.pc));

        // Move the program counter to next instruction
        self.state.pc = self.state.pc.wrapping_add(2);

        decode(raw)
    }

    /// The word at the program counter and what it decodes to, without executing it.
    pub fn next_instruction(&self) -> (u16, Instruction) {
        let raw = self.state.memory.read_word(usize::from(self.state.pc));
        (raw, decode(raw))
    }

    pub fn is_render_due(&self) -> bool {
        self.state.display.is_dirty()
    }

    pub fn acknowledge_render_done(&mut self) {
        self.state.display.acknowledge();
    }

    pub fn is_sound_active(&self) -> bool {
        self.state.timers.sound > 0
    }

    /// Replaces the keypad latch. A snapshot that is not exactly 16 keys is ignored
    /// and `false` is returned.
    pub fn set_keypad_state(&mut self, snapshot: &[bool]) -> bool {
        self.state.keypad.set_state(snapshot)
    }

    /// Byte at `address`, or 0 for addresses outside memory.
    pub fn read_memory_byte(&self, address: usize) -> u8 {
        self.state.memory.read(address)
    }

    pub fn memory_len(&self) -> usize {
        self.state.memory.len()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.state.display
    }

    /// An owned copy of the current framebuffer, for handing to another thread.
    pub fn snapshot(&self) -> Framebuffer {
        self.state.display.clone()
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn index(&self) -> u16 {
        self.state.index
    }

    /// Value of register V`x`. Only the low nibble of `x` is used, so 0x1A reads VA.
    pub fn register(&self, x: u8) -> u8 {
        self.state.registers.read(Register::from_nibble(x))
    }

    pub fn delay_timer(&self) -> Timer {
        self.state.timers.delay
    }

    pub fn sound_timer(&self) -> Timer {
        self.state.timers.sound
    }

    pub fn stack_depth(&self) -> usize {
        self.state.stack.depth()
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Returns to the power-on state, keeping the configuration. The program is gone
    /// and must be loaded again.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// One host frame: inject the latest keys, run `cycles` steps, present the
    /// framebuffer if it changed, and update the tone.
    ///
    /// With a `trace` writer every instruction is logged as `PC  OPCODE  MNEMONIC`
    /// before it executes.
    pub fn run_frame(
        &mut self,
        cycles: u32,
        input: &mut impl InputSource,
        display: &mut impl DisplaySink,
        audio: &mut impl AudioSink,
        mut trace: Option<&mut dyn Write>,
    ) -> anyhow::Result<()> {
        let keys = input.poll_keys()?;
        self.set_keypad_state(&keys);

        for _ in 0..cycles {
            if let Some(out) = trace.as_deref_mut() {
                let (raw, instruction) = self.next_instruction();
                writeln!(out, "{:03X}  {raw:04X}  {instruction}", self.pc())?;
            }
            self.execute_cycle();
        }

        if self.is_render_due() {
            display.present(self.framebuffer())?;
            self.acknowledge_render_done();
        }
        audio.set_tone(self.is_sound_active());
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut Chip8State {
        &mut self.state
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
