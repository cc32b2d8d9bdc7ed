use rand::Rng;

use super::{
    AddressOutOfRange, Chip8, Chip8Error, Chip8Result, FONT_GLYPH_SIZE, FONT_START_ADDRESS,
    Keypad, Opcode, OpcodeALU, StackError,
};
use crate::u4;

/// Why an instruction could not be applied, before PC/opcode context is attached.
#[derive(Debug)]
pub(crate) enum Fault {
    Unsupported,
    Stack(StackError),
    Memory(AddressOutOfRange),
}

impl Fault {
    pub(crate) fn at(self, opcode: u16, pc: u16) -> Chip8Error {
        log::debug!("Fault {self:?} at {pc:03X} ({opcode:04X})");

        match self {
            Fault::Unsupported => Chip8Error::UnsupportedOpcode { opcode, pc },
            Fault::Stack(StackError::Overflow) => Chip8Error::StackOverflow { opcode, pc },
            Fault::Stack(StackError::Underflow) => Chip8Error::StackUnderflow { opcode, pc },
            Fault::Memory(AddressOutOfRange { address }) => {
                Chip8Error::AddressOutOfRange { address, pc }
            }
        }
    }
}

impl From<StackError> for Fault {
    fn from(e: StackError) -> Self {
        Fault::Stack(e)
    }
}

impl From<AddressOutOfRange> for Fault {
    fn from(e: AddressOutOfRange) -> Self {
        Fault::Memory(e)
    }
}

/// Where the program counter goes after an instruction.
enum Flow {
    /// PC + 2
    Next,
    /// PC + 4
    Skip,
    /// PC unchanged, the instruction runs again
    Repeat,
    Jump(u16),
}

impl Flow {
    fn skip_if(condition: bool) -> Self {
        if condition { Flow::Skip } else { Flow::Next }
    }
}

impl Chip8 {
    /// Applies one decoded instruction. PC is only written once the instruction has succeeded.
    pub(crate) fn execute(
        &mut self,
        opcode: Opcode,
        keys: &Keypad,
    ) -> Result<Chip8Result, Fault> {
        let mut result = Chip8Result::Continue;
        let regs = &mut self.registers;

        let flow = match opcode {
            Opcode::ClearDisplay => {
                self.display.clear();
                Flow::Next
            }
            Opcode::Jump { nnn } => Flow::Jump(nnn.into()),
            Opcode::JumpWithOffset { nnn } => {
                Flow::Jump(u16::from(nnn).wrapping_add(regs.v[0].into()))
            }
            Opcode::Call { nnn } => {
                regs.stack.push(regs.pc.wrapping_add(2))?;
                Flow::Jump(nnn.into())
            }
            Opcode::Return => Flow::Jump(regs.stack.pop()?),
            Opcode::SkipRegEqualImm { x, nn } => Flow::skip_if(regs.v[x] == nn),
            Opcode::SkipRegNotEqualImm { x, nn } => Flow::skip_if(regs.v[x] != nn),
            Opcode::SkipRegEqualReg { x, y } => Flow::skip_if(regs.v[x] == regs.v[y]),
            Opcode::SkipRegNotEqualReg { x, y } => Flow::skip_if(regs.v[x] != regs.v[y]),
            Opcode::SetRegImm { x, nn } => {
                regs.v[x] = nn;
                Flow::Next
            }
            Opcode::AddRegImm { x, nn } => {
                regs.v[x] = regs.v[x].wrapping_add(nn);
                Flow::Next
            }
            Opcode::ALU { x, y, op } => {
                self.execute_alu(x, y, op);
                Flow::Next
            }
            Opcode::Random { x, nn } => {
                let rand_byte: u8 = self.rng.random();
                regs.v[x] = rand_byte & nn;
                Flow::Next
            }
            Opcode::SetIndexImm { nnn } => {
                regs.i = nnn.into();
                Flow::Next
            }
            Opcode::AddIndexReg { x } => {
                regs.i = regs.i.wrapping_add(regs.v[x].into());
                Flow::Next
            }
            Opcode::Draw { x, y, n } => {
                self.execute_draw(x, y, n)?;
                if self.quirks.display_wait {
                    result = Chip8Result::WaitForNextFrame;
                }
                Flow::Next
            }
            Opcode::SkipIfPressed { x } => {
                Flow::skip_if(keys.is_pressed(u4::from_low(regs.v[x])))
            }
            Opcode::SkipIfNotPressed { x } => {
                Flow::skip_if(!keys.is_pressed(u4::from_low(regs.v[x])))
            }
            Opcode::WaitForKey { x } => {
                let flow = self.execute_wait_for_key(x, keys);
                if matches!(flow, Flow::Repeat) {
                    result = Chip8Result::WaitForNextFrame;
                }
                flow
            }
            Opcode::ReadDelayTimer { x } => {
                regs.v[x] = regs.delay_timer;
                Flow::Next
            }
            Opcode::SetDelayTimer { x } => {
                regs.delay_timer = regs.v[x];
                Flow::Next
            }
            Opcode::SetSoundTimer { x } => {
                regs.sound_timer = regs.v[x];
                Flow::Next
            }
            Opcode::FontChar { x } => {
                let digit = regs.v[x] & 0x0F;
                regs.i = (FONT_START_ADDRESS + digit as usize * FONT_GLYPH_SIZE) as u16;
                Flow::Next
            }
            Opcode::BCD { x } => {
                let value = regs.v[x];
                let i = regs.i;
                // Check the whole range first so a fault never leaves a partial write
                self.memory.slice(i, 3)?;
                self.memory.write(i, value / 100)?;
                self.memory.write(i.wrapping_add(1), (value / 10) % 10)?;
                self.memory.write(i.wrapping_add(2), value % 10)?;
                Flow::Next
            }
            Opcode::StoreRegs { x } => {
                let count = usize::from(x) + 1;
                self.memory.slice(regs.i, count)?;
                for (offset, value) in regs.v[..count].iter().enumerate() {
                    self.memory.write(regs.i.wrapping_add(offset as u16), *value)?;
                }
                if self.quirks.load_store_increments_i {
                    regs.i = regs.i.wrapping_add(count as u16);
                }
                Flow::Next
            }
            Opcode::LoadRegs { x } => {
                let count = usize::from(x) + 1;
                let bytes = self.memory.slice(regs.i, count)?;
                regs.v[..count].copy_from_slice(bytes);
                if self.quirks.load_store_increments_i {
                    regs.i = regs.i.wrapping_add(count as u16);
                }
                Flow::Next
            }
            Opcode::Unknown(_) => return Err(Fault::Unsupported),
        };

        let pc = self.registers.pc;
        self.registers.pc = match flow {
            Flow::Next => pc.wrapping_add(2),
            Flow::Skip => pc.wrapping_add(4),
            Flow::Repeat => pc,
            Flow::Jump(address) => address,
        };

        Ok(result)
    }

    fn execute_alu(&mut self, x: u4, y: u4, op: OpcodeALU) {
        let quirks = self.quirks;
        let v = &mut self.registers.v;

        match op {
            OpcodeALU::Set => v[x] = v[y],
            OpcodeALU::Or => {
                v[x] |= v[y];
                if quirks.logic_resets_vf {
                    v[0xF] = 0;
                }
            }
            OpcodeALU::And => {
                v[x] &= v[y];
                if quirks.logic_resets_vf {
                    v[0xF] = 0;
                }
            }
            OpcodeALU::Xor => {
                v[x] ^= v[y];
                if quirks.logic_resets_vf {
                    v[0xF] = 0;
                }
            }
            OpcodeALU::Add => {
                let (res, overflow) = v[x].overflowing_add(v[y]);
                v[x] = res;
                v[0xF] = overflow as u8;
            }
            OpcodeALU::Sub => {
                let (res, borrow) = v[x].overflowing_sub(v[y]);
                v[x] = res;
                v[0xF] = !borrow as u8; // Notice that borrow is inverted
            }
            OpcodeALU::SubReverse => {
                let (res, borrow) = v[y].overflowing_sub(v[x]);
                v[x] = res;
                v[0xF] = !borrow as u8;
            }
            OpcodeALU::ShiftRight => {
                let source = if quirks.shift_uses_vy { v[y] } else { v[x] };
                v[x] = source >> 1;
                v[0xF] = source & 1;
            }
            OpcodeALU::ShiftLeft => {
                let source = if quirks.shift_uses_vy { v[y] } else { v[x] };
                v[x] = source << 1;
                v[0xF] = source >> 7;
            }
        }
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<(), AddressOutOfRange> {
        let regs = &mut self.registers;
        let rows = self.memory.slice(regs.i, usize::from(n))?;

        let any_erased = self.display.draw_sprite(regs.v[x], regs.v[y], rows);
        regs.v[0xF] = any_erased as u8;
        Ok(())
    }

    fn execute_wait_for_key(&mut self, x: u4, keys: &Keypad) -> Flow {
        if let Some(key) = self.wait_release_key
            && !keys.is_pressed(key)
        {
            // The key we were waiting for has been released
            self.registers.v[x] = key.get();
            self.wait_release_key = None;
            return Flow::Next;
        }

        if self.wait_release_key.is_none() {
            // Not waiting for a key release yet, check all keys
            self.wait_release_key = keys.first_pressed();
        }

        // Repeat this instruction until a key is released
        Flow::Repeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emu::{Config, Quirks};

    fn chip8_with(rom: &[u8]) -> Chip8 {
        chip8_with_quirks(rom, Quirks::cosmac())
    }

    fn chip8_with_quirks(rom: &[u8], quirks: Quirks) -> Chip8 {
        let mut chip8 = Chip8::with_config(&Config {
            quirks,
            seed: Some(8),
            ..Config::default()
        });
        chip8.load(rom).unwrap();
        chip8
    }

    fn step(chip8: &mut Chip8) -> Chip8Result {
        chip8.cpu_cycle(&Keypad::new()).unwrap()
    }

    #[test]
    fn set_register_touches_only_vx() {
        for x in 0..16u8 {
            for nn in [0x00, 0x01, 0x7F, 0x80, 0xFF] {
                let mut chip8 = chip8_with(&[0x60 | x, nn]);
                step(&mut chip8);

                for reg in 0..16 {
                    let expected = if reg == x as usize { nn } else { 0 };
                    assert_eq!(chip8.registers.v[reg], expected);
                }
                assert_eq!(chip8.pc(), 0x202);
            }
        }
    }

    #[test]
    fn add_immediate_wraps_without_flag() {
        let mut chip8 = chip8_with(&[0x63, 0xF0, 0x73, 0x20]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.registers.v[3], 0x10);
        assert_eq!(chip8.registers.v[0xF], 0);
    }

    #[test]
    fn skip_if_equal_immediate() {
        for (vx, nn, expected_pc) in [(0, 0, 0x206), (5, 5, 0x206), (5, 6, 0x204), (0xFF, 0, 0x204)]
        {
            let mut chip8 = chip8_with(&[0x61, vx, 0x31, nn]);
            step(&mut chip8);
            step(&mut chip8);
            assert_eq!(chip8.pc(), expected_pc, "V1={vx:#04X} nn={nn:#04X}");
        }
    }

    #[test]
    fn skip_if_not_equal_immediate() {
        let mut chip8 = chip8_with(&[0x41, 0x00]);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x202);

        let mut chip8 = chip8_with(&[0x41, 0x01]);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x204);
    }

    #[test]
    fn skip_on_register_compare() {
        let mut chip8 = chip8_with(&[0x50, 0x10, 0x90, 0x10]);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x204);

        let mut chip8 = chip8_with(&[0x61, 0x01, 0x90, 0x10]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x206);
    }

    #[test]
    fn jump_and_jump_with_offset() {
        let mut chip8 = chip8_with(&[0x13, 0x45]);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x345);

        let mut chip8 = chip8_with(&[0x60, 0x10, 0xB3, 0x00]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x310);
    }

    #[test]
    fn call_pushes_return_address() {
        let mut chip8 = chip8_with(&[0x00, 0xE0, 0x23, 0x00]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x300);
        assert_eq!(chip8.registers.stack.as_slice(), &[0x204]);
    }

    #[test]
    fn return_uses_popped_address_directly() {
        let mut chip8 = chip8_with(&[0x22, 0x04, 0x00, 0x00, 0x00, 0xEE]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x202);
        assert_eq!(chip8.registers.stack.depth(), 0);
    }

    #[test]
    fn return_on_empty_stack_underflows() {
        let mut chip8 = chip8_with(&[0x00, 0xEE]);
        let err = chip8.cpu_cycle(&Keypad::new()).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::StackUnderflow {
                opcode: 0x00EE,
                pc: 0x200
            }
        ));
    }

    #[test]
    fn alu_logic_resets_vf_under_cosmac() {
        // V0 = 0b1100, V1 = 0b1010, VF = 7
        let setup = [0x60, 0x0C, 0x61, 0x0A, 0x6F, 0x07];
        for (selector, expected) in [(0x1, 0x0E), (0x2, 0x08), (0x3, 0x06)] {
            let mut rom = setup.to_vec();
            rom.extend([0x80, 0x10 | selector]);
            let mut chip8 = chip8_with(&rom);
            for _ in 0..4 {
                step(&mut chip8);
            }
            assert_eq!(chip8.registers.v[0], expected);
            assert_eq!(chip8.registers.v[0xF], 0);
        }

        let mut chip8 = chip8_with_quirks(
            &[0x6F, 0x07, 0x80, 0x11],
            Quirks::modern(),
        );
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.registers.v[0xF], 7);
    }

    #[test]
    fn alu_set_copies_vy() {
        let mut chip8 = chip8_with(&[0x60, 0x11, 0x61, 0x5A, 0x6F, 0x07, 0x80, 0x10]);
        for _ in 0..4 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x5A);
        assert_eq!(chip8.registers.v[1], 0x5A);
        assert_eq!(chip8.registers.v[0xF], 7);
    }

    #[test]
    fn alu_add_sets_carry() {
        let mut chip8 = chip8_with(&[0x60, 0xFF, 0x61, 0x02, 0x80, 0x14]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x01);
        assert_eq!(chip8.registers.v[0xF], 1);

        let mut chip8 = chip8_with(&[0x60, 0x10, 0x61, 0x02, 0x80, 0x14]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x12);
        assert_eq!(chip8.registers.v[0xF], 0);
    }

    #[test]
    fn alu_sub_sets_not_borrow() {
        let mut chip8 = chip8_with(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x15]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x02);
        assert_eq!(chip8.registers.v[0xF], 1);

        let mut chip8 = chip8_with(&[0x60, 0x03, 0x61, 0x05, 0x80, 0x15]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0xFE);
        assert_eq!(chip8.registers.v[0xF], 0);

        let mut chip8 = chip8_with(&[0x60, 0x03, 0x61, 0x05, 0x80, 0x17]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x02);
        assert_eq!(chip8.registers.v[0xF], 1);
    }

    #[test]
    fn flag_wins_when_vf_is_destination() {
        let mut chip8 = chip8_with(&[0x6F, 0xFF, 0x61, 0x01, 0x8F, 0x14]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0xF], 1);
    }

    #[test]
    fn shifts_follow_quirks() {
        // V0 = 0x01, V1 = 0x81, then 8016 / 801E
        let rom = [0x60, 0x01, 0x61, 0x81, 0x80, 0x16];
        let mut chip8 = chip8_with(&rom);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x40);
        assert_eq!(chip8.registers.v[0xF], 1);

        let mut chip8 = chip8_with_quirks(&rom, Quirks::modern());
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x00);
        assert_eq!(chip8.registers.v[0xF], 1);

        let rom = [0x60, 0x01, 0x61, 0x81, 0x80, 0x1E];
        let mut chip8 = chip8_with(&rom);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.v[0], 0x02);
        assert_eq!(chip8.registers.v[0xF], 1);
    }

    #[test]
    fn random_is_masked() {
        let mut chip8 = chip8_with(&[0xC2, 0x0F, 0xC3, 0x00]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.registers.v[2] & 0xF0, 0);
        assert_eq!(chip8.registers.v[3], 0);
    }

    #[test]
    fn random_is_reproducible_with_seed() {
        let rom = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];
        let mut a = chip8_with(&rom);
        let mut b = chip8_with(&rom);
        for _ in 0..3 {
            step(&mut a);
            step(&mut b);
        }
        assert_eq!(a.registers.v, b.registers.v);
    }

    #[test]
    fn index_operations() {
        let mut chip8 = chip8_with(&[0xA1, 0x23, 0x60, 0x10, 0xF0, 0x1E]);
        step(&mut chip8);
        assert_eq!(chip8.registers.i, 0x123);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.registers.i, 0x133);
    }

    #[test]
    fn font_char_points_at_glyph() {
        let mut chip8 = chip8_with(&[0x60, 0x1A, 0xF0, 0x29]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.registers.i, 0x50 + 0xA * 5);
        assert_eq!(chip8.memory.read(chip8.registers.i).unwrap(), 0xF0);
    }

    #[test]
    fn draw_sets_collision_flag() {
        // I = 0x050 (glyph 0), draw at (V0, V0) twice
        let mut chip8 = chip8_with(&[0xA0, 0x50, 0xD0, 0x05, 0xD0, 0x05]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.registers.v[0xF], 0);
        assert_eq!(chip8.display.lit_count(), 14);
        step(&mut chip8);
        assert_eq!(chip8.registers.v[0xF], 1);
        assert_eq!(chip8.display.lit_count(), 0);
    }

    #[test]
    fn draw_past_end_of_memory_fails() {
        let mut chip8 = chip8_with(&[0xAF, 0xFE, 0xD0, 0x03]);
        step(&mut chip8);
        let err = chip8.cpu_cycle(&Keypad::new()).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::AddressOutOfRange {
                address: 0x1000,
                pc: 0x202
            }
        ));
        assert_eq!(chip8.display.lit_count(), 0);
    }

    #[test]
    fn display_wait_ends_frame_after_draw() {
        let rom = [0xD0, 0x01];
        let mut chip8 = chip8_with(&rom);
        assert_eq!(step(&mut chip8), Chip8Result::Continue);

        let mut quirks = Quirks::cosmac();
        quirks.display_wait = true;
        let mut chip8 = chip8_with_quirks(&rom, quirks);
        assert_eq!(step(&mut chip8), Chip8Result::WaitForNextFrame);
    }

    #[test]
    fn clear_display() {
        let mut chip8 = chip8_with(&[0x00, 0xE0]);
        chip8.display.draw_sprite(0, 0, &[0xFF]);
        step(&mut chip8);
        assert_eq!(chip8.display.lit_count(), 0);
        assert_eq!(chip8.pc(), 0x202);
    }

    #[test]
    fn key_skips_use_snapshot() {
        let rom = [0x60, 0x07, 0xE0, 0x9E];
        let pressed = Keypad::with_pressed([u4::new(7)]);

        let mut chip8 = chip8_with(&rom);
        step(&mut chip8);
        chip8.cpu_cycle(&pressed).unwrap();
        assert_eq!(chip8.pc(), 0x206);

        let mut chip8 = chip8_with(&rom);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.pc(), 0x204);

        let mut chip8 = chip8_with(&[0x60, 0x07, 0xE0, 0xA1]);
        step(&mut chip8);
        chip8.cpu_cycle(&pressed).unwrap();
        assert_eq!(chip8.pc(), 0x204);
    }

    #[test]
    fn wait_for_key_blocks_until_release() {
        let mut chip8 = chip8_with(&[0xF5, 0x0A]);
        let idle = Keypad::new();
        let pressed = Keypad::with_pressed([u4::new(0xB)]);

        assert_eq!(chip8.cpu_cycle(&idle).unwrap(), Chip8Result::WaitForNextFrame);
        assert_eq!(chip8.pc(), 0x200);

        assert_eq!(chip8.cpu_cycle(&pressed).unwrap(), Chip8Result::WaitForNextFrame);
        assert_eq!(chip8.cpu_cycle(&pressed).unwrap(), Chip8Result::WaitForNextFrame);
        assert_eq!(chip8.pc(), 0x200);

        assert_eq!(chip8.cpu_cycle(&idle).unwrap(), Chip8Result::Continue);
        assert_eq!(chip8.registers.v[5], 0xB);
        assert_eq!(chip8.pc(), 0x202);
    }

    #[test]
    fn timer_registers() {
        let mut chip8 = chip8_with(&[0x60, 0x30, 0xF0, 0x15, 0xF0, 0x18, 0xF1, 0x07]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.registers.delay_timer, 0x30);
        assert_eq!(chip8.registers.sound_timer, 0x30);
        chip8.timers_cycle();
        step(&mut chip8);
        assert_eq!(chip8.registers.v[1], 0x2F);
    }

    #[test]
    fn bcd_uses_vx() {
        let mut chip8 = chip8_with(&[0x65, 0xFE, 0xA3, 0x00, 0xF5, 0x33]);
        for _ in 0..3 {
            step(&mut chip8);
        }
        assert_eq!(chip8.memory.slice(0x300, 3).unwrap(), &[2, 5, 4]);
        assert_eq!(chip8.registers.i, 0x300);
    }

    #[test]
    fn bcd_at_end_of_memory_leaves_memory_untouched() {
        let mut chip8 = chip8_with(&[0x60, 0x99, 0xAF, 0xFE, 0xF0, 0x33]);
        step(&mut chip8);
        step(&mut chip8);
        assert!(chip8.cpu_cycle(&Keypad::new()).is_err());
        assert_eq!(chip8.memory.read(0xFFE).unwrap(), 0);
    }

    #[test]
    fn store_and_load_registers() {
        let mut chip8 = chip8_with(&[
            0x60, 0x11, 0x61, 0x22, 0x62, 0x33, // V0..V2
            0xA4, 0x00, 0xF2, 0x55, // store at 0x400
            0x60, 0x00, 0x61, 0x00, 0x62, 0x00, // clobber
            0xA4, 0x00, 0xF1, 0x65, // load V0..V1 back
        ]);
        for _ in 0..5 {
            step(&mut chip8);
        }
        assert_eq!(chip8.memory.slice(0x400, 4).unwrap(), &[0x11, 0x22, 0x33, 0]);
        assert_eq!(chip8.registers.i, 0x403);

        for _ in 0..5 {
            step(&mut chip8);
        }
        assert_eq!(&chip8.registers.v[..3], &[0x11, 0x22, 0x00]);
        assert_eq!(chip8.registers.i, 0x402);
    }

    #[test]
    fn store_past_end_of_memory_writes_nothing() {
        let mut chip8 = chip8_with(&[
            0x60, 0x11, 0x61, 0x22, 0x62, 0x33, 0x63, 0x44, // V0..V3
            0xAF, 0xFE, 0xF3, 0x55, // store V0..V3 at 0xFFE
        ]);
        for _ in 0..5 {
            step(&mut chip8);
        }

        match chip8.cpu_cycle(&Keypad::new()) {
            Err(Chip8Error::AddressOutOfRange { address, pc }) => {
                assert_eq!(address, 0x1000);
                assert_eq!(pc, 0x20A);
            }
            other => panic!("expected AddressOutOfRange, got {other:?}"),
        }
        assert_eq!(chip8.memory.slice(0xFFE, 2).unwrap(), &[0, 0]);
        assert_eq!(chip8.registers.i, 0xFFE);
        assert_eq!(chip8.pc(), 0x20A);
    }

    #[test]
    fn load_past_end_of_memory_reads_nothing() {
        let mut chip8 = chip8_with(&[0x60, 0x11, 0x63, 0x44, 0xAF, 0xFE, 0xF3, 0x65]);
        chip8.memory.write(0xFFE, 0xAA).unwrap();
        chip8.memory.write(0xFFF, 0xBB).unwrap();
        for _ in 0..3 {
            step(&mut chip8);
        }
        let before = chip8.registers.v;

        match chip8.cpu_cycle(&Keypad::new()) {
            Err(Chip8Error::AddressOutOfRange { address, pc }) => {
                assert_eq!(address, 0x1000);
                assert_eq!(pc, 0x206);
            }
            other => panic!("expected AddressOutOfRange, got {other:?}"),
        }
        assert_eq!(chip8.registers.v, before);
        assert_eq!(chip8.registers.v[0], 0x11);
        assert_eq!(chip8.registers.i, 0xFFE);
        assert_eq!(chip8.pc(), 0x206);
    }

    #[test]
    fn store_keeps_index_under_modern_quirks() {
        let mut chip8 = chip8_with_quirks(&[0xA4, 0x00, 0xF3, 0x55], Quirks::modern());
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.registers.i, 0x400);
    }

    #[test]
    fn unknown_opcode_is_unsupported() {
        let mut chip8 = chip8_with(&[0x01, 0x23]);
        assert!(matches!(
            chip8.cpu_cycle(&Keypad::new()),
            Err(Chip8Error::UnsupportedOpcode {
                opcode: 0x0123,
                pc: 0x200
            })
        ));
    }
}
