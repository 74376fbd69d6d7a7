mod emulator;

use std::path::PathBuf;

use anyhow::Context;
use chip8vm::{Config, Interpreter, decode};
use chip8vm::state::{DEFAULT_INSTRUCTIONS_PER_SECOND, DEFAULT_TIMER_HZ, PC_START_ADDR};
use clap::Parser;

use crate::emulator::{Emulator, Settings};

/// Play a CHIP-8 program in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the program image
    rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND)]
    ips: u32,

    /// Display refresh and keyboard poll rate
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Delay and sound timer rate
    #[arg(long, default_value_t = DEFAULT_TIMER_HZ)]
    timer_hz: u32,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Frequency of the tone in Hz
    #[arg(long, default_value_t = 440.0)]
    tone: f32,

    /// Print a listing of the program and exit
    #[arg(long)]
    disassemble: bool,

    /// Write every executed instruction to stderr
    #[arg(long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::from_rates(args.ips, args.timer_hz);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let mut interpreter = Interpreter::new(config);
    let rom_len = interpreter
        .load_program(&args.rom)
        .with_context(|| format!("could not load {}", args.rom.display()))?;

    if args.disassemble {
        disassemble(&interpreter, rom_len);
        return Ok(());
    }

    let settings = Settings {
        frame_rate: args.fps.max(1),
        ips: args.ips.max(1),
        tone: args.tone,
        trace: args.trace,
        rom: args.rom,
    };
    Emulator::new(interpreter, settings).run()
}

fn disassemble(interpreter: &Interpreter, rom_len: usize) {
    let end = PC_START_ADDR + rom_len;
    for addr in (PC_START_ADDR..end).step_by(2) {
        let raw = u16::from_be_bytes([
            interpreter.read_memory_byte(addr),
            interpreter.read_memory_byte(addr + 1),
        ]);
        println!("{addr:03X}: {raw:04X}  {}", decode(raw));
    }
}
