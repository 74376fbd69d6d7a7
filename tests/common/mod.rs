#![allow(dead_code)]

use std::path::PathBuf;

use chip8vm::{Config, Interpreter};

/// Packs opcodes into a big-endian program image.
pub fn assemble(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// A seeded interpreter with `words` loaded at 0x200.
pub fn boot(words: &[u16]) -> Interpreter {
    let mut chip8 = Interpreter::new(Config::default().with_seed(0xC8));
    chip8.load_program_bytes(&assemble(words));
    chip8
}

pub fn step(chip8: &mut Interpreter, cycles: usize) {
    for _ in 0..cycles {
        chip8.execute_cycle();
    }
}

/// A file under the system temp dir that is removed when dropped.
pub struct TempRom {
    pub path: PathBuf,
}

impl TempRom {
    pub fn new(name: &str, bytes: &[u8]) -> Self {
        let path = std::env::temp_dir().join(format!(
            "chip8vm-{}-{name}.ch8",
            std::process::id()
        ));
        std::fs::write(&path, bytes).expect("write temp rom");
        TempRom { path }
    }
}

impl Drop for TempRom {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
