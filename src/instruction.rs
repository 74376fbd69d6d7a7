use std::fmt;

use rand::Rng;

use crate::font::glyph_addr;
use crate::state::{Chip8State, Register};

/// One decoded CHIP-8 instruction.
///
/// Every 16-bit word decodes to something: words that match no defined pattern
/// become [`Instruction::Unknown`] and execute as no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    SubroutineReturn,
    /// 0NNN, a native machine routine. Not supported, executes as a no-op.
    Sys(u16),
    /// 1NNN
    Jump(u16),
    /// 2NNN
    SubroutineCall(u16),
    /// 3XNN
    SkipEqImmediate(Register, u8),
    /// 4XNN
    SkipNeqImmediate(Register, u8),
    /// 5XY0
    SkipEqRegister(Register, Register),
    /// 6XNN
    SetImmediate(Register, u8),
    /// 7XNN
    AddImmediate(Register, u8),
    /// 8XY0
    SetXToY(Register, Register),
    /// 8XY1
    BinaryOr(Register, Register),
    /// 8XY2
    BinaryAnd(Register, Register),
    /// 8XY3
    BinaryXor(Register, Register),
    /// 8XY4
    AddWithCarry(Register, Register),
    /// 8XY5
    SubtractYFromX(Register, Register),
    /// 8XY6
    RightShift(Register, Register),
    /// 8XY7
    SubtractXFromY(Register, Register),
    /// 8XYE
    LeftShift(Register, Register),
    /// 9XY0
    SkipNeqRegister(Register, Register),
    /// ANNN
    SetIndex(u16),
    /// BNNN
    JumpWithOffset(u16),
    /// CXNN
    Random(Register, u8),
    /// DXYN
    Draw(Register, Register, u8),
    /// EX9E
    SkipIfKeyPressed(Register),
    /// EXA1
    SkipIfKeyNotPressed(Register),
    /// FX07
    SetXFromDelayTimer(Register),
    /// FX0A
    WaitForKey(Register),
    /// FX15
    SetDelayTimer(Register),
    /// FX18
    SetSoundTimer(Register),
    /// FX1E
    AddToIndex(Register),
    /// FX29
    FontChar(Register),
    /// FX33
    BinaryCodedDecimal(Register),
    /// FX55
    Store(Register),
    /// FX65
    Load(Register),
    /// Any word that matches none of the above.
    Unknown(u16),
}

struct DecodedInstruction {
    /// First nibble. Represents the operation code.
    opcode: u8,
    /// Second nibble. Used to look up one of the 16 registers.
    x: Register,
    /// Third nibble. Used to look up one of the 16 registers.
    y: Register,
    /// Fourth nibble. A 4-bit number.
    n: u8,
    /// The second byte (third and fourth nibbles). An 8-bit immediate number.
    nn: u8,
    /// The second, third, and fourth nibbles. A 12-bit immediate address.
    nnn: u16,
}
impl DecodedInstruction {
    fn new(raw: u16) -> Self {
        DecodedInstruction {
            opcode: (raw >> 12) as u8,
            x: Register::from_nibble((raw >> 8) as u8),
            y: Register::from_nibble((raw >> 4) as u8),
            n: (raw & 0x0F) as u8,
            nn: (raw & 0x00FF) as u8,
            nnn: raw & 0x0FFF,
        }
    }
}

pub fn decode(raw: u16) -> Instruction {
    use Instruction::*;

    let DecodedInstruction {
        opcode,
        x,
        y,
        n,
        nn,
        nnn,
    } = DecodedInstruction::new(raw);

    match opcode {
        0x0 => match nnn {
            0x0E0 => ClearScreen,
            0x0EE => SubroutineReturn,
            _ => Sys(nnn),
        },
        0x1 => Jump(nnn),
        0x2 => SubroutineCall(nnn),
        0x3 => SkipEqImmediate(x, nn),
        0x4 => SkipNeqImmediate(x, nn),
        0x5 if n == 0 => SkipEqRegister(x, y),
        0x6 => SetImmediate(x, nn),
        0x7 => AddImmediate(x, nn),
        0x8 => match n {
            0x0 => SetXToY(x, y),
            0x1 => BinaryOr(x, y),
            0x2 => BinaryAnd(x, y),
            0x3 => BinaryXor(x, y),
            0x4 => AddWithCarry(x, y),
            0x5 => SubtractYFromX(x, y),
            0x6 => RightShift(x, y),
            0x7 => SubtractXFromY(x, y),
            0xE => LeftShift(x, y),
            _ => Unknown(raw),
        },
        0x9 if n == 0 => SkipNeqRegister(x, y),
        0xA => SetIndex(nnn),
        0xB => JumpWithOffset(nnn),
        0xC => Random(x, nn),
        0xD => Draw(x, y, n),
        0xE => match nn {
            0x9E => SkipIfKeyPressed(x),
            0xA1 => SkipIfKeyNotPressed(x),
            _ => Unknown(raw),
        },
        0xF => match nn {
            0x07 => SetXFromDelayTimer(x),
            0x0A => WaitForKey(x),
            0x15 => SetDelayTimer(x),
            0x18 => SetSoundTimer(x),
            0x1E => AddToIndex(x),
            0x29 => FontChar(x),
            0x33 => BinaryCodedDecimal(x),
            0x55 => Store(x),
            0x65 => Load(x),
            _ => Unknown(raw),
        },
        _ => Unknown(raw),
    }
}

impl Instruction {
    /// Applies the instruction to `state`.
    ///
    /// The program counter must already point past this instruction: jumps overwrite it
    /// and skips add a further 2.
    pub fn execute(&self, state: &mut Chip8State) {
        use Instruction::*;

        match *self {
            ClearScreen => state.display.clear(),
            SubroutineReturn => {
                if let Some(return_address) = state.stack.pop() {
                    state.pc = return_address;
                }
            }
            Sys(_) | Unknown(_) => {}
            Jump(nnn) => state.pc = nnn,
            SubroutineCall(nnn) => {
                // A call that does not fit on the stack is dropped entirely.
                if state.stack.push(state.pc) {
                    state.pc = nnn;
                }
            }
            SkipEqImmediate(x, nn) => {
                if state.registers.read(x) == nn {
                    state.skip();
                }
            }
            SkipNeqImmediate(x, nn) => {
                if state.registers.read(x) != nn {
                    state.skip();
                }
            }
            SkipEqRegister(x, y) => {
                if state.registers.read(x) == state.registers.read(y) {
                    state.skip();
                }
            }
            SkipNeqRegister(x, y) => {
                if state.registers.read(x) != state.registers.read(y) {
                    state.skip();
                }
            }
            SetImmediate(x, nn) => state.registers.write(x, nn),
            AddImmediate(x, nn) => {
                let value_x = state.registers.read(x);
                state.registers.write(x, value_x.wrapping_add(nn));
            }
            SetXToY(x, y) => {
                let value_y = state.registers.read(y);
                state.registers.write(x, value_y);
            }
            BinaryOr(x, y) => {
                let value = state.registers.read(x) | state.registers.read(y);
                state.registers.write(x, value);
            }
            BinaryAnd(x, y) => {
                let value = state.registers.read(x) & state.registers.read(y);
                state.registers.write(x, value);
            }
            BinaryXor(x, y) => {
                let value = state.registers.read(x) ^ state.registers.read(y);
                state.registers.write(x, value);
            }
            // The arithmetic and shift forms read both operands up front, write VF,
            // then write VX. When X is VF the result therefore wins over the flag.
            AddWithCarry(x, y) => {
                let (sum, carry) = state
                    .registers
                    .read(x)
                    .overflowing_add(state.registers.read(y));
                state.registers.set_flag(carry);
                state.registers.write(x, sum);
            }
            SubtractYFromX(x, y) => {
                let value_x = state.registers.read(x);
                let value_y = state.registers.read(y);
                state.registers.set_flag(value_y <= value_x);
                state.registers.write(x, value_x.wrapping_sub(value_y));
            }
            SubtractXFromY(x, y) => {
                let value_x = state.registers.read(x);
                let value_y = state.registers.read(y);
                state.registers.set_flag(value_x <= value_y);
                state.registers.write(x, value_y.wrapping_sub(value_x));
            }
            RightShift(x, y) => {
                let value_y = state.registers.read(y);
                state.registers.write(Register::VF, value_y & 0x01);
                state.registers.write(x, value_y >> 1);
            }
            LeftShift(x, y) => {
                let value_y = state.registers.read(y);
                state.registers.write(Register::VF, value_y >> 7);
                state.registers.write(x, value_y << 1);
            }
            SetIndex(nnn) => state.index = nnn,
            JumpWithOffset(nnn) => {
                state.pc = nnn.wrapping_add(u16::from(state.registers.read(Register::V0)));
            }
            Random(x, nn) => {
                let random_value = state.rng.random::<u8>() & nn;
                state.registers.write(x, random_value);
            }
            Draw(x, y, n) => {
                let origin_x = usize::from(state.registers.read(x));
                let origin_y = usize::from(state.registers.read(y));

                state.registers.set_flag(false);
                let sprite = state.memory.read_sprite(usize::from(state.index), n);
                if state.display.draw_sprite(origin_x, origin_y, sprite) {
                    state.registers.set_flag(true);
                }
            }
            SkipIfKeyPressed(x) => {
                if state.keypad.is_key_pressed(state.registers.read(x)) {
                    state.skip();
                }
            }
            SkipIfKeyNotPressed(x) => {
                if !state.keypad.is_key_pressed(state.registers.read(x)) {
                    state.skip();
                }
            }
            SetXFromDelayTimer(x) => state.registers.write(x, state.timers.delay),
            WaitForKey(x) => match state.keypad.first_pressed() {
                Some(key) => state.registers.write(x, key),
                // Re-run this instruction next cycle until a key shows up.
                None => state.pc = state.pc.wrapping_sub(2),
            },
            SetDelayTimer(x) => state.timers.delay = state.registers.read(x),
            SetSoundTimer(x) => state.timers.set_sound(state.registers.read(x)),
            AddToIndex(x) => {
                state.index = state
                    .index
                    .wrapping_add(u16::from(state.registers.read(x)));
            }
            FontChar(x) => state.index = glyph_addr(state.registers.read(x)) as u16,
            BinaryCodedDecimal(x) => {
                let value_x = state.registers.read(x);
                let bcd = [value_x / 100, (value_x / 10) % 10, value_x % 10];
                for (i, &digit) in bcd.iter().enumerate() {
                    state.write_indexed(i, digit);
                }
            }
            Store(x) => {
                for (i, reg) in x.up_to().enumerate() {
                    let value = state.registers.read(reg);
                    state.write_indexed(i, value);
                }
                state.index = state.index.wrapping_add(x.index() as u16 + 1);
            }
            Load(x) => {
                for (i, reg) in x.up_to().enumerate() {
                    let value = state.read_indexed(i);
                    state.registers.write(reg, value);
                }
                state.index = state.index.wrapping_add(x.index() as u16 + 1);
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            SubroutineReturn => write!(f, "RET"),
            Sys(nnn) => write!(f, "SYS {nnn:#05X}"),
            Jump(nnn) => write!(f, "JP {nnn:#05X}"),
            SubroutineCall(nnn) => write!(f, "CALL {nnn:#05X}"),
            SkipEqImmediate(x, nn) => write!(f, "SE {x}, {nn:#04X}"),
            SkipNeqImmediate(x, nn) => write!(f, "SNE {x}, {nn:#04X}"),
            SkipEqRegister(x, y) => write!(f, "SE {x}, {y}"),
            SetImmediate(x, nn) => write!(f, "LD {x}, {nn:#04X}"),
            AddImmediate(x, nn) => write!(f, "ADD {x}, {nn:#04X}"),
            SetXToY(x, y) => write!(f, "LD {x}, {y}"),
            BinaryOr(x, y) => write!(f, "OR {x}, {y}"),
            BinaryAnd(x, y) => write!(f, "AND {x}, {y}"),
            BinaryXor(x, y) => write!(f, "XOR {x}, {y}"),
            AddWithCarry(x, y) => write!(f, "ADD {x}, {y}"),
            SubtractYFromX(x, y) => write!(f, "SUB {x}, {y}"),
            RightShift(x, y) => write!(f, "SHR {x}, {y}"),
            SubtractXFromY(x, y) => write!(f, "SUBN {x}, {y}"),
            LeftShift(x, y) => write!(f, "SHL {x}, {y}"),
            SkipNeqRegister(x, y) => write!(f, "SNE {x}, {y}"),
            SetIndex(nnn) => write!(f, "LD I, {nnn:#05X}"),
            JumpWithOffset(nnn) => write!(f, "JP V0, {nnn:#05X}"),
            Random(x, nn) => write!(f, "RND {x}, {nn:#04X}"),
            Draw(x, y, n) => write!(f, "DRW {x}, {y}, {n}"),
            SkipIfKeyPressed(x) => write!(f, "SKP {x}"),
            SkipIfKeyNotPressed(x) => write!(f, "SKNP {x}"),
            SetXFromDelayTimer(x) => write!(f, "LD {x}, DT"),
            WaitForKey(x) => write!(f, "LD {x}, K"),
            SetDelayTimer(x) => write!(f, "LD DT, {x}"),
            SetSoundTimer(x) => write!(f, "LD ST, {x}"),
            AddToIndex(x) => write!(f, "ADD I, {x}"),
            FontChar(x) => write!(f, "LD F, {x}"),
            BinaryCodedDecimal(x) => write!(f, "LD B, {x}"),
            Store(x) => write!(f, "LD [I], {x}"),
            Load(x) => write!(f, "LD {x}, [I]"),
            Unknown(raw) => write!(f, "DW {raw:#06X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Config;
    use crate::state::Register::*;

    fn state() -> Chip8State {
        Chip8State::new(Config::default().with_seed(7))
    }

    fn run(state: &mut Chip8State, raw: u16) {
        decode(raw).execute(state);
    }

    #[test]
    fn decodes_every_defined_pattern() {
        let cases = [
            (0x00E0, Instruction::ClearScreen),
            (0x00EE, Instruction::SubroutineReturn),
            (0x0123, Instruction::Sys(0x123)),
            (0x1ABC, Instruction::Jump(0xABC)),
            (0x2ABC, Instruction::SubroutineCall(0xABC)),
            (0x3A12, Instruction::SkipEqImmediate(VA, 0x12)),
            (0x4A12, Instruction::SkipNeqImmediate(VA, 0x12)),
            (0x5AB0, Instruction::SkipEqRegister(VA, VB)),
            (0x6A12, Instruction::SetImmediate(VA, 0x12)),
            (0x7A12, Instruction::AddImmediate(VA, 0x12)),
            (0x8AB0, Instruction::SetXToY(VA, VB)),
            (0x8AB1, Instruction::BinaryOr(VA, VB)),
            (0x8AB2, Instruction::BinaryAnd(VA, VB)),
            (0x8AB3, Instruction::BinaryXor(VA, VB)),
            (0x8AB4, Instruction::AddWithCarry(VA, VB)),
            (0x8AB5, Instruction::SubtractYFromX(VA, VB)),
            (0x8AB6, Instruction::RightShift(VA, VB)),
            (0x8AB7, Instruction::SubtractXFromY(VA, VB)),
            (0x8ABE, Instruction::LeftShift(VA, VB)),
            (0x9AB0, Instruction::SkipNeqRegister(VA, VB)),
            (0xA123, Instruction::SetIndex(0x123)),
            (0xB123, Instruction::JumpWithOffset(0x123)),
            (0xCA0F, Instruction::Random(VA, 0x0F)),
            (0xDAB5, Instruction::Draw(VA, VB, 5)),
            (0xEA9E, Instruction::SkipIfKeyPressed(VA)),
            (0xEAA1, Instruction::SkipIfKeyNotPressed(VA)),
            (0xFA07, Instruction::SetXFromDelayTimer(VA)),
            (0xFA0A, Instruction::WaitForKey(VA)),
            (0xFA15, Instruction::SetDelayTimer(VA)),
            (0xFA18, Instruction::SetSoundTimer(VA)),
            (0xFA1E, Instruction::AddToIndex(VA)),
            (0xFA29, Instruction::FontChar(VA)),
            (0xFA33, Instruction::BinaryCodedDecimal(VA)),
            (0xFA55, Instruction::Store(VA)),
            (0xFA65, Instruction::Load(VA)),
        ];
        for (raw, expected) in cases {
            assert_eq!(decode(raw), expected, "decoding {raw:#06X}");
        }
    }

    #[test]
    fn undefined_trailing_bits_decode_as_unknown() {
        for raw in [0x5AB1, 0x8AB8, 0x8ABF, 0x9AB3, 0xEA00, 0xFA99] {
            assert_eq!(decode(raw), Instruction::Unknown(raw));
        }
    }

    #[test]
    fn unknown_leaves_state_untouched() {
        let mut s = state();
        s.pc = 0x202;
        run(&mut s, 0x8AB8);
        run(&mut s, 0x0123);
        assert_eq!(s.pc, 0x202);
        assert_eq!(s.registers.read(VF), 0);
    }

    #[test]
    fn add_with_carry_sets_flag() {
        let mut s = state();
        s.registers.write(V1, 0xF0);
        s.registers.write(V2, 0x20);
        run(&mut s, 0x8124);
        assert_eq!(s.registers.read(V1), 0x10);
        assert_eq!(s.registers.read(VF), 1);

        run(&mut s, 0x8124);
        assert_eq!(s.registers.read(V1), 0x30);
        assert_eq!(s.registers.read(VF), 0);
    }

    #[test]
    fn add_into_vf_keeps_sum() {
        let mut s = state();
        s.registers.write(VF, 0x10);
        s.registers.write(V1, 0x02);
        run(&mut s, 0x8F14);
        assert_eq!(s.registers.read(VF), 0x12);
    }

    #[test]
    fn flag_source_operand_is_read_before_flag_write() {
        let mut s = state();
        s.registers.write(V0, 0x10);
        s.registers.write(VF, 0x01);
        // V0 - VF with VF as the source: uses VF = 1, not the freshly written flag
        run(&mut s, 0x80F5);
        assert_eq!(s.registers.read(V0), 0x0F);
        assert_eq!(s.registers.read(VF), 1);
    }

    #[test]
    fn subtract_borrow_polarity() {
        let mut s = state();
        s.registers.write(V1, 5);
        s.registers.write(V2, 5);
        run(&mut s, 0x8125);
        assert_eq!((s.registers.read(V1), s.registers.read(VF)), (0, 1));

        s.registers.write(V1, 3);
        run(&mut s, 0x8125);
        assert_eq!((s.registers.read(V1), s.registers.read(VF)), (0xFE, 0));

        s.registers.write(V1, 7);
        s.registers.write(V2, 3);
        run(&mut s, 0x8127);
        assert_eq!((s.registers.read(V1), s.registers.read(VF)), (0xFC, 0));
    }

    #[test]
    fn shifts_read_vy_and_leave_it() {
        let mut s = state();
        s.registers.write(V2, 0b1000_0011);
        run(&mut s, 0x8126);
        assert_eq!(s.registers.read(V1), 0b0100_0001);
        assert_eq!(s.registers.read(VF), 1);
        assert_eq!(s.registers.read(V2), 0b1000_0011);

        run(&mut s, 0x812E);
        assert_eq!(s.registers.read(V1), 0b0000_0110);
        assert_eq!(s.registers.read(VF), 1);

        s.registers.write(V2, 0x02);
        run(&mut s, 0x812E);
        assert_eq!(s.registers.read(VF), 0);
    }

    #[test]
    fn shift_from_vf_uses_value_before_flag_write() {
        let mut s = state();
        s.registers.write(VF, 6);
        run(&mut s, 0x81F6);
        assert_eq!((s.registers.read(V1), s.registers.read(VF)), (3, 0));

        s.registers.write(VF, 5);
        run(&mut s, 0x81F5);
        assert_eq!((s.registers.read(V1), s.registers.read(VF)), (0xFE, 0));
    }

    #[test]
    fn logic_ops_leave_flag_alone() {
        let mut s = state();
        s.registers.write(VF, 0x42);
        s.registers.write(V1, 0b1100);
        s.registers.write(V2, 0b1010);
        run(&mut s, 0x8121);
        assert_eq!(s.registers.read(V1), 0b1110);
        run(&mut s, 0x8122);
        assert_eq!(s.registers.read(V1), 0b1010);
        run(&mut s, 0x8123);
        assert_eq!(s.registers.read(V1), 0);
        assert_eq!(s.registers.read(VF), 0x42);
    }

    #[test]
    fn add_immediate_wraps_without_flag() {
        let mut s = state();
        s.registers.write(V3, 0xFF);
        run(&mut s, 0x7302);
        assert_eq!(s.registers.read(V3), 0x01);
        assert_eq!(s.registers.read(VF), 0);
    }

    #[test]
    fn skips_add_two() {
        let mut s = state();
        s.pc = 0x202;
        s.registers.write(V4, 0x33);
        run(&mut s, 0x3433);
        assert_eq!(s.pc, 0x204);
        run(&mut s, 0x4433);
        assert_eq!(s.pc, 0x204);
        run(&mut s, 0x5450);
        assert_eq!(s.pc, 0x204);
        run(&mut s, 0x9450);
        assert_eq!(s.pc, 0x206);
    }

    #[test]
    fn jump_with_offset_adds_v0() {
        let mut s = state();
        s.registers.write(V0, 0x10);
        run(&mut s, 0xB300);
        assert_eq!(s.pc, 0x310);
    }

    #[test]
    fn call_past_capacity_is_dropped() {
        let mut s = state();
        for _ in 0..12 {
            run(&mut s, 0x2400);
        }
        s.pc = 0x222;
        run(&mut s, 0x2600);
        assert_eq!(s.pc, 0x222);
        assert_eq!(s.stack.depth(), 12);
    }

    #[test]
    fn return_on_empty_stack_is_noop() {
        let mut s = state();
        s.pc = 0x246;
        run(&mut s, 0x00EE);
        assert_eq!(s.pc, 0x246);
    }

    #[test]
    fn random_respects_mask() {
        let mut s = state();
        for _ in 0..64 {
            run(&mut s, 0xC50F);
            assert_eq!(s.registers.read(V5) & 0xF0, 0);
        }
        run(&mut s, 0xC500);
        assert_eq!(s.registers.read(V5), 0);
    }

    #[test]
    fn draw_reports_collision_in_vf() {
        let mut s = state();
        s.index = 0x300;
        s.memory.write(0x300, 0xFF);
        s.registers.write(VF, 0x55);
        run(&mut s, 0xD011);
        assert_eq!(s.registers.read(VF), 0);
        assert_eq!(s.display.lit_count(), 8);
        run(&mut s, 0xD011);
        assert_eq!(s.registers.read(VF), 1);
        assert_eq!(s.display.lit_count(), 0);
    }

    #[test]
    fn draw_wraps_origin_from_registers() {
        let mut s = state();
        s.index = glyph_addr(0) as u16;
        s.registers.write(V1, 64 + 3);
        s.registers.write(V2, 32 + 4);
        run(&mut s, 0xD125);
        assert!(s.display.pixel(3, 4));
    }

    #[test]
    fn key_skips_treat_out_of_range_as_released() {
        let mut s = state();
        s.pc = 0x200;
        s.registers.write(V1, 0x20);
        run(&mut s, 0xE19E);
        assert_eq!(s.pc, 0x200);
        run(&mut s, 0xE1A1);
        assert_eq!(s.pc, 0x202);

        let mut keys = [false; 16];
        keys[0xA] = true;
        s.keypad.set_state(&keys);
        s.registers.write(V1, 0xA);
        run(&mut s, 0xE19E);
        assert_eq!(s.pc, 0x204);
        run(&mut s, 0xE1A1);
        assert_eq!(s.pc, 0x204);
    }

    #[test]
    fn wait_for_key_rewinds_until_pressed() {
        let mut s = state();
        s.pc = 0x202;
        run(&mut s, 0xF30A);
        assert_eq!(s.pc, 0x200);

        let mut keys = [false; 16];
        keys[0x9] = true;
        keys[0xC] = true;
        s.keypad.set_state(&keys);
        s.pc = 0x202;
        run(&mut s, 0xF30A);
        assert_eq!(s.pc, 0x202);
        assert_eq!(s.registers.read(V3), 0x9);
    }

    #[test]
    fn timer_loads() {
        let mut s = state();
        s.registers.write(V2, 1);
        run(&mut s, 0xF218);
        assert_eq!(s.timers.sound, 0);
        s.registers.write(V2, 9);
        run(&mut s, 0xF218);
        run(&mut s, 0xF215);
        assert_eq!((s.timers.delay, s.timers.sound), (9, 9));
        s.timers.delay = 4;
        run(&mut s, 0xF607);
        assert_eq!(s.registers.read(V6), 4);
    }

    #[test]
    fn index_arithmetic() {
        let mut s = state();
        s.index = 0xFFFE;
        s.registers.write(V1, 3);
        run(&mut s, 0xF11E);
        assert_eq!(s.index, 0x0001);

        s.registers.write(V1, 0xB);
        run(&mut s, 0xF129);
        assert_eq!(usize::from(s.index), glyph_addr(0xB));
    }

    #[test]
    fn font_char_past_hex_digits_points_beyond_table() {
        let mut s = state();
        s.registers.write(V0, 0x10);
        run(&mut s, 0xF029);
        assert_eq!(s.index, 0x200);
    }

    #[test]
    fn bcd_digits() {
        let mut s = state();
        s.index = 0x400;
        s.registers.write(V7, 47);
        run(&mut s, 0xF733);
        assert_eq!(
            [s.memory.read(0x400), s.memory.read(0x401), s.memory.read(0x402)],
            [0, 4, 7]
        );
        assert_eq!(s.index, 0x400);
    }

    #[test]
    fn store_and_load_advance_index() {
        let mut s = state();
        s.index = 0x500;
        for (i, reg) in V3.up_to().enumerate() {
            s.registers.write(reg, 0x10 + i as u8);
        }
        s.registers.write(V4, 0x99);
        run(&mut s, 0xF355);
        assert_eq!(s.index, 0x504);
        assert_eq!(s.memory.read(0x503), 0x13);
        assert_eq!(s.memory.read(0x504), 0);

        s.index = 0x501;
        run(&mut s, 0xF165);
        assert_eq!(s.registers.read(V0), 0x11);
        assert_eq!(s.registers.read(V1), 0x12);
        assert_eq!(s.registers.read(V2), 0x12);
        assert_eq!(s.index, 0x503);
    }

    #[test]
    fn mnemonics() {
        assert_eq!(decode(0x00E0).to_string(), "CLS");
        assert_eq!(decode(0x1208).to_string(), "JP 0x208");
        assert_eq!(decode(0x632A).to_string(), "LD V3, 0x2A");
        assert_eq!(decode(0xD015).to_string(), "DRW V0, V1, 5");
        assert_eq!(decode(0xFA55).to_string(), "LD [I], VA");
        assert_eq!(decode(0x5AB1).to_string(), "DW 0x5AB1");
    }
}
