use std::num::NonZeroU32;

use rand::{SeedableRng, rngs::StdRng};

use crate::display::Framebuffer;
use crate::font::{FONT_ADDR, font_bytes};

pub type Timer = u8;
pub type Address = usize;

pub const MEM_SIZE: usize = 4096;
pub const PC_START_ADDR: Address = 0x200;
pub const NUM_REGISTERS: usize = 16;
pub const NUM_KEYS: usize = 16;
pub const STACK_CAPACITY: usize = 12;
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 600;
pub const DEFAULT_TIMER_HZ: u32 = 60;

/// 4 KiB of byte-addressable memory with the font preloaded below 0x200.
///
/// Every access is total: reads past the end return 0 and writes past the end are dropped.
pub struct Memory {
    data: [u8; MEM_SIZE],
}
impl Memory {
    pub fn new() -> Self {
        let font_data = font_bytes();
        let data = {
            let mut data = [0; MEM_SIZE];
            data[FONT_ADDR..FONT_ADDR + font_data.len()].copy_from_slice(&font_data);
            data
        };

        Memory { data }
    }

    pub fn read(&self, addr: Address) -> u8 {
        self.data.get(addr).copied().unwrap_or(0)
    }

    pub fn write(&mut self, addr: Address, value: u8) {
        if let Some(byte) = self.data.get_mut(addr) {
            *byte = value;
        }
    }

    /// Big-endian 16-bit word at `addr`.
    pub fn read_word(&self, addr: Address) -> u16 {
        u16::from_be_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Copies `rom` in at 0x200 without any size check against the program area.
    /// Bytes that would land past the end of memory are lost. Returns the number of
    /// bytes that were stored.
    pub fn load_rom(&mut self, rom: &[u8]) -> usize {
        let end = (PC_START_ADDR + rom.len()).min(MEM_SIZE);
        let stored = end - PC_START_ADDR;
        self.data[PC_START_ADDR..end].copy_from_slice(&rom[..stored]);
        stored
    }

    /// Up to `rows` bytes starting at `index`, cut short at the end of memory.
    pub fn read_sprite(&self, index: Address, rows: u8) -> &[u8] {
        let start = index.min(MEM_SIZE);
        let end = index.saturating_add(usize::from(rows)).min(MEM_SIZE);
        &self.data[start..end]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
impl Register {
    /// Maps the low nibble of `value` onto a register.
    pub fn from_nibble(value: u8) -> Self {
        match value & 0x0F {
            0x0 => Register::V0,
            0x1 => Register::V1,
            0x2 => Register::V2,
            0x3 => Register::V3,
            0x4 => Register::V4,
            0x5 => Register::V5,
            0x6 => Register::V6,
            0x7 => Register::V7,
            0x8 => Register::V8,
            0x9 => Register::V9,
            0xA => Register::VA,
            0xB => Register::VB,
            0xC => Register::VC,
            0xD => Register::VD,
            0xE => Register::VE,
            _ => Register::VF,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Registers V0 through `self`, inclusive.
    pub fn up_to(self) -> impl Iterator<Item = Register> {
        (0..=self as u8).map(Register::from_nibble)
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{:X}", self.index())
    }
}

pub struct RegisterBank {
    registers: [u8; NUM_REGISTERS],
}
impl RegisterBank {
    pub fn new() -> Self {
        RegisterBank {
            registers: [0; NUM_REGISTERS],
        }
    }

    pub fn read(&self, reg: Register) -> u8 {
        self.registers[reg.index()]
    }

    pub fn write(&mut self, reg: Register, value: u8) {
        self.registers[reg.index()] = value;
    }

    pub fn set_flag(&mut self, set: bool) {
        self.write(Register::VF, u8::from(set));
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Return addresses for nested subroutine calls, at most [`STACK_CAPACITY`] deep.
pub struct CallStack {
    frames: [u16; STACK_CAPACITY],
    depth: usize,
}
impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: [0; STACK_CAPACITY],
            depth: 0,
        }
    }

    /// Returns false, leaving the stack untouched, when it is already full.
    pub fn push(&mut self, addr: u16) -> bool {
        if self.depth >= STACK_CAPACITY {
            return false;
        }
        self.frames[self.depth] = addr;
        self.depth += 1;
        true
    }

    pub fn pop(&mut self) -> Option<u16> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        Some(self.frames[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay and sound timers, decremented once every `cycles_per_tick` instruction cycles.
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
    cycles_per_tick: NonZeroU32,
    cycle_count: u32,
}
impl Timers {
    pub fn new(cycles_per_tick: NonZeroU32) -> Self {
        Timers {
            delay: 0,
            sound: 0,
            cycles_per_tick,
            cycle_count: 0,
        }
    }

    /// Counts one executed cycle, decrementing both timers when it completes a tick.
    pub fn on_cycle(&mut self) {
        self.cycle_count = (self.cycle_count + 1) % self.cycles_per_tick.get();
        if self.cycle_count != 0 {
            return;
        }
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// The sound timer ignores 0 and 1.
    pub fn set_sound(&mut self, value: Timer) {
        if value > 1 {
            self.sound = value;
        }
    }
}

/// Latest 16-key snapshot delivered by the input collaborator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}
impl Keypad {
    pub fn new() -> Self {
        Keypad {
            keys: [false; NUM_KEYS],
        }
    }

    /// Replaces the whole latch. Snapshots that are not exactly 16 keys are ignored.
    pub fn set_state(&mut self, snapshot: &[bool]) -> bool {
        match <[bool; NUM_KEYS]>::try_from(snapshot) {
            Ok(keys) => {
                self.keys = keys;
                true
            }
            Err(_) => false,
        }
    }

    /// Values past 0xF never name a key and read as released.
    pub fn is_key_pressed(&self, key: u8) -> bool {
        self.keys.get(usize::from(key)).copied().unwrap_or(false)
    }

    /// Lowest-numbered key currently held.
    pub fn first_pressed(&self) -> Option<u8> {
        (0..NUM_KEYS as u8).find(|&key| self.is_key_pressed(key))
    }
}

/// Construction-time settings for the interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Instruction cycles per delay/sound timer decrement.
    pub cycles_per_timer_tick: NonZeroU32,
    /// Seed for CXNN. `None` seeds from the operating system.
    pub rng_seed: Option<u64>,
}
impl Config {
    pub fn new(cycles_per_timer_tick: NonZeroU32) -> Self {
        Config {
            cycles_per_timer_tick,
            rng_seed: None,
        }
    }

    /// Derives the cycle ratio from an instruction rate and a timer rate, never below 1.
    pub fn from_rates(instructions_per_second: u32, timer_hz: u32) -> Self {
        let ratio = instructions_per_second
            .checked_div(timer_hz)
            .unwrap_or(instructions_per_second);
        Self::new(NonZeroU32::new(ratio).unwrap_or(NonZeroU32::MIN))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_rates(DEFAULT_INSTRUCTIONS_PER_SECOND, DEFAULT_TIMER_HZ)
    }
}

pub struct Chip8State {
    pub config: Config,
    pub memory: Memory,
    pub registers: RegisterBank,
    pub pc: u16,
    pub index: u16,
    pub stack: CallStack,
    pub timers: Timers,
    pub display: Framebuffer,
    pub keypad: Keypad,
    pub rng: StdRng,
}
impl Chip8State {
    pub fn new(config: Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Chip8State {
            config,
            memory: Memory::new(),
            registers: RegisterBank::new(),
            pc: PC_START_ADDR as u16,
            index: 0,
            stack: CallStack::new(),
            timers: Timers::new(config.cycles_per_timer_tick),
            display: Framebuffer::new(),
            keypad: Keypad::new(),
            rng,
        }
    }

    pub fn reset(&mut self) {
        *self = Chip8State::new(self.config);
    }

    /// Skips the instruction after the current one.
    pub fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Byte at `index + offset`, where the index register is the base pointer.
    pub fn read_indexed(&self, offset: usize) -> u8 {
        self.memory.read(usize::from(self.index) + offset)
    }

    pub fn write_indexed(&mut self, offset: usize, value: u8) {
        self.memory.write(usize::from(self.index) + offset, value);
    }
}
