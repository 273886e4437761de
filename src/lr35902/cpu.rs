use crate::error::DotError;
use crate::lr35902::decode::{decode, Condition, Opcode};
use crate::lr35902::handlers::Handlers;
use crate::lr35902::registers::{Flags, Reg16, Reg8, RegisterFile};
use crate::memory::mmu::Mmu;
use log::trace;

#[derive(Clone)]
pub struct Cpu {
    registers: RegisterFile,
    ime: bool,
    halted: bool,
    cycles: usize,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            registers: RegisterFile::default(),
            ime: false,
            halted: false,
            cycles: 0,
        }
    }

    /// Executes one instruction: decode at `PC` (which advances past every
    /// fetched byte), then run the matching handler.
    pub fn step(&mut self, mmu: &mut Mmu) -> Result<(), DotError> {
        let pc = self.read_register16(Reg16::PC);
        let instruction = decode(self, mmu)?;

        trace!(
            "[{:04x}] {:<20} [{}  (SP): ${:02x}]",
            pc,
            format!("{}", instruction),
            self,
            mmu.read(self.read_register16(Reg16::SP))
        );

        let cycles = match instruction.opcode {
            Opcode::Nop => Handlers::nop(self, mmu, &instruction),
            Opcode::Ld | Opcode::Ldh => Handlers::load(self, mmu, &instruction),
            Opcode::Push => Handlers::push(self, mmu, &instruction),
            Opcode::Pop => Handlers::pop(self, mmu, &instruction),
            Opcode::Add => Handlers::add(self, mmu, &instruction),
            Opcode::Adc => Handlers::add_with_carry(self, mmu, &instruction),
            Opcode::Sub => Handlers::sub(self, mmu, &instruction),
            Opcode::Sbc => Handlers::sub_with_carry(self, mmu, &instruction),
            Opcode::And => Handlers::and(self, mmu, &instruction),
            Opcode::Xor => Handlers::xor(self, mmu, &instruction),
            Opcode::Or => Handlers::or(self, mmu, &instruction),
            Opcode::Cp => Handlers::compare(self, mmu, &instruction),
            Opcode::Inc => Handlers::increment(self, mmu, &instruction),
            Opcode::Dec => Handlers::decrement(self, mmu, &instruction),
            Opcode::Daa => Handlers::decimal_adjust(self, mmu, &instruction),
            Opcode::Cpl => Handlers::complement(self, mmu, &instruction),
            Opcode::Ccf | Opcode::Scf => Handlers::carry_flag(self, mmu, &instruction),
            Opcode::Rlca | Opcode::Rla | Opcode::Rlc | Opcode::Rl => {
                Handlers::rotate_left(self, mmu, &instruction)
            }
            Opcode::Rrca | Opcode::Rra | Opcode::Rrc | Opcode::Rr => {
                Handlers::rotate_right(self, mmu, &instruction)
            }
            Opcode::Sla | Opcode::Sra | Opcode::Srl => Handlers::shift(self, mmu, &instruction),
            Opcode::Swap => Handlers::swap(self, mmu, &instruction),
            Opcode::Bit => Handlers::test_bit(self, mmu, &instruction),
            Opcode::Res => Handlers::reset_bit(self, mmu, &instruction),
            Opcode::Set => Handlers::set_bit(self, mmu, &instruction),
            Opcode::Jp | Opcode::Jr | Opcode::Call => Handlers::jump(self, mmu, &instruction),
            Opcode::Ret | Opcode::Reti => Handlers::ret(self, mmu, &instruction),
            Opcode::Rst => Handlers::restart(self, mmu, &instruction),
            Opcode::Halt => Handlers::halt(self, mmu, &instruction),
            Opcode::Stop => Handlers::nop(self, mmu, &instruction),
            Opcode::Di | Opcode::Ei => Handlers::handle_interrupt_toggle(self, mmu, &instruction),
        }?;

        self.cycles += cycles;

        Ok(())
    }

    /// Reads the byte at `PC` and advances `PC` by one.
    pub fn fetch_byte(&mut self, mmu: &Mmu) -> u8 {
        let pc = self.registers.read16(Reg16::PC);
        self.registers.write16(Reg16::PC, pc.wrapping_add(1));
        mmu.read(pc)
    }

    /// Reads a little-endian word at `PC` and advances `PC` by two.
    pub fn fetch_word(&mut self, mmu: &Mmu) -> u16 {
        let lo = self.fetch_byte(mmu) as u16;
        let hi = self.fetch_byte(mmu) as u16;
        (hi << 8) | lo
    }

    /// Grows the stack down by two and stores `value` little-endian at the
    /// new `SP`.
    pub fn push_stack(&mut self, mmu: &mut Mmu, value: u16) {
        let sp = self.registers.read16(Reg16::SP).wrapping_sub(2);
        self.registers.write16(Reg16::SP, sp);
        mmu.write16(sp, value);
    }

    pub fn pop_stack(&mut self, mmu: &Mmu) -> u16 {
        let sp = self.registers.read16(Reg16::SP);
        let value = mmu.read16(sp);
        self.registers.write16(Reg16::SP, sp.wrapping_add(2));
        value
    }

    pub fn read_register(&self, register: Reg8) -> u8 {
        self.registers.read8(register)
    }

    pub fn write_register(&mut self, register: Reg8, value: u8) {
        self.registers.write8(register, value);
    }

    pub fn read_register16(&self, register: Reg16) -> u16 {
        self.registers.read16(register)
    }

    pub fn write_register16(&mut self, register: Reg16, value: u16) {
        self.registers.write16(register, value);
    }

    pub fn update_flag(&mut self, flag: Flags, value: bool) {
        self.registers.set_flag(flag, value);
    }

    pub fn read_flag(&self, flag: Flags) -> bool {
        self.registers.flags().contains(flag)
    }

    /// Condition codes read Z at bit 7 and C at bit 4 of the flag byte.
    pub fn check_condition(&self, condition: &Condition) -> bool {
        match condition {
            Condition::None => true,
            Condition::NZ => !self.read_flag(Flags::ZERO),
            Condition::Z => self.read_flag(Flags::ZERO),
            Condition::NC => !self.read_flag(Flags::CARRY),
            Condition::C => self.read_flag(Flags::CARRY),
        }
    }

    pub fn enable_interrupts(&mut self) {
        self.ime = true;
    }

    pub fn disable_interrupts(&mut self) {
        self.ime = false;
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.ime
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn resume(&mut self) {
        self.halted = false;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

impl std::fmt::Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "A: ${:02x}  F: ${:02x}  B: ${:02x}  C: ${:02x}  D: ${:02x}  E: ${:02x}  H: ${:02x}  L: ${:02x}  SP: ${:04x}  PC: ${:04x}  cycles: {}",
            self.registers.read8(Reg8::A),
            self.registers.flags().bits(),
            self.registers.read8(Reg8::B),
            self.registers.read8(Reg8::C),
            self.registers.read8(Reg8::D),
            self.registers.read8(Reg8::E),
            self.registers.read8(Reg8::H),
            self.registers.read8(Reg8::L),
            self.registers.read16(Reg16::SP),
            self.registers.read16(Reg16::PC),
            self.cycles
        )
    }
}
