use crate::error::DotError;
use crate::lr35902::cpu::Cpu;
use crate::lr35902::decode::{AddressingMode, Condition, Instruction, Opcode, Operand};
use crate::lr35902::registers::{Flags, Reg16, Reg8};
use crate::memory::mmu::Mmu;

const HIGH_PAGE: u16 = 0xff00;

pub struct Handlers {}

impl Handlers {
    pub fn nop(_cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        Ok(instruction.cycles.0)
    }

    pub fn load(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        // ld hl, sp+e is the one load that touches flags
        if let Operand::DisplacedReg16(Reg16::SP, offset) = rhs {
            let value = Self::stack_pointer_offset(cpu, *offset);
            cpu.write_register16(Reg16::HL, value);
            return Ok(instruction.cycles.0);
        }

        match lhs {
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::DIRECT) => {
                let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
                cpu.write_register(*reg, value);
            }
            // ld ($ff00+c), a
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::INDIRECT) => {
                let addr = HIGH_PAGE + cpu.read_register(*reg) as u16;
                let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
                mmu.write(addr, value);
            }
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::INDIRECT) => {
                let addr = cpu.read_register16(*reg);
                let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
                mmu.write(addr, value);
                Self::apply_post_op(cpu, *reg, *mode);
            }
            Operand::Reg16(reg, _) => {
                let value = Self::resolve16(cpu, rhs, instruction)?;
                cpu.write_register16(*reg, value);
            }
            // ldh ($ff00+n), a
            Operand::Imm8(offset, mode) if mode.contains(AddressingMode::INDIRECT) => {
                let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
                mmu.write(HIGH_PAGE + *offset as u16, value);
            }
            Operand::Imm16(addr, mode) if mode.contains(AddressingMode::INDIRECT) => match rhs {
                // ld (nn), sp stores the whole word
                Operand::Reg16(Reg16::SP, _) => mmu.write16(*addr, cpu.read_register16(Reg16::SP)),
                _ => {
                    let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
                    mmu.write(*addr, value);
                }
            },
            _ => return Err(Self::invalid(instruction)),
        }

        Ok(instruction.cycles.0)
    }

    pub fn push(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let Some(Operand::Reg16(reg, _)) = instruction.lhs else {
            return Err(Self::invalid(instruction));
        };

        let value = cpu.read_register16(reg);
        cpu.push_stack(mmu, value);

        Ok(instruction.cycles.0)
    }

    pub fn pop(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let Some(Operand::Reg16(reg, _)) = instruction.lhs else {
            return Err(Self::invalid(instruction));
        };

        let value = cpu.pop_stack(mmu);
        cpu.write_register16(reg, value);

        Ok(instruction.cycles.0)
    }

    pub fn add(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        match instruction.lhs {
            Some(Operand::Reg8(Reg8::A, _)) => {
                let a = cpu.read_register(Reg8::A);
                let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
                let result = a.wrapping_add(value);

                cpu.update_flag(Flags::ZERO, result == 0);
                cpu.update_flag(Flags::SUBTRACT, false);
                cpu.update_flag(Flags::HALF_CARRY, (result & 0xf) < (a & 0xf));
                cpu.update_flag(Flags::CARRY, result < a);

                cpu.write_register(Reg8::A, result);
            }
            // add hl, r16: Z untouched, carries out of bits 11 and 15
            Some(Operand::Reg16(Reg16::HL, _)) => {
                let hl = cpu.read_register16(Reg16::HL);
                let value = Self::resolve16(cpu, rhs, instruction)?;
                let result = hl.wrapping_add(value);

                cpu.update_flag(Flags::SUBTRACT, false);
                cpu.update_flag(Flags::HALF_CARRY, (result & 0x0fff) < (hl & 0x0fff));
                cpu.update_flag(Flags::CARRY, result < hl);

                cpu.write_register16(Reg16::HL, result);
            }
            Some(Operand::Reg16(Reg16::SP, _)) => {
                let Operand::Offset(offset) = rhs else {
                    return Err(Self::invalid(instruction));
                };
                let result = Self::stack_pointer_offset(cpu, *offset);
                cpu.write_register16(Reg16::SP, result);
            }
            _ => return Err(Self::invalid(instruction)),
        }

        Ok(instruction.cycles.0)
    }

    pub fn add_with_carry(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let carry = cpu.read_flag(Flags::CARRY) as u8;

        let a = cpu.read_register(Reg8::A);
        let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
        let result = a.wrapping_add(value).wrapping_add(carry);

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, (result & 0xf) < (a & 0xf));
        cpu.update_flag(Flags::CARRY, result < a);

        cpu.write_register(Reg8::A, result);

        Ok(instruction.cycles.0)
    }

    pub fn sub(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        let a = cpu.read_register(Reg8::A);
        let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
        let result = a.wrapping_sub(value);

        Self::set_sub_flags(cpu, a, result);
        cpu.write_register(Reg8::A, result);

        Ok(instruction.cycles.0)
    }

    pub fn sub_with_carry(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let carry = cpu.read_flag(Flags::CARRY) as u8;

        let a = cpu.read_register(Reg8::A);
        let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
        let result = a.wrapping_sub(value).wrapping_sub(carry);

        Self::set_sub_flags(cpu, a, result);
        cpu.write_register(Reg8::A, result);

        Ok(instruction.cycles.0)
    }

    /// `cp` is a subtraction that discards its result.
    pub fn compare(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        let a = cpu.read_register(Reg8::A);
        let value = Self::resolve8(cpu, mmu, rhs, instruction)?;
        let result = a.wrapping_sub(value);

        Self::set_sub_flags(cpu, a, result);

        Ok(instruction.cycles.0)
    }

    pub fn and(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        let result = cpu.read_register(Reg8::A) & Self::resolve8(cpu, mmu, rhs, instruction)?;
        cpu.write_register(Reg8::A, result);

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, true);
        cpu.update_flag(Flags::CARRY, false);

        Ok(instruction.cycles.0)
    }

    pub fn xor(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        let result = cpu.read_register(Reg8::A) ^ Self::resolve8(cpu, mmu, rhs, instruction)?;
        cpu.write_register(Reg8::A, result);
        Self::set_logic_flags(cpu, result);

        Ok(instruction.cycles.0)
    }

    pub fn or(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        let result = cpu.read_register(Reg8::A) | Self::resolve8(cpu, mmu, rhs, instruction)?;
        cpu.write_register(Reg8::A, result);
        Self::set_logic_flags(cpu, result);

        Ok(instruction.cycles.0)
    }

    pub fn increment(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        // 16-bit inc leaves the flags alone
        if let Operand::Reg16(reg, mode) = lhs {
            if mode.contains(AddressingMode::DIRECT) {
                let value = cpu.read_register16(*reg).wrapping_add(1);
                cpu.write_register16(*reg, value);
                return Ok(instruction.cycles.0);
            }
        }

        let value = Self::resolve8(cpu, mmu, lhs, instruction)?;
        let result = value.wrapping_add(1);

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, (result & 0xf) < (value & 0xf));

        Self::write_back(cpu, mmu, lhs, result, instruction)?;

        Ok(instruction.cycles.0)
    }

    pub fn decrement(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        if let Operand::Reg16(reg, mode) = lhs {
            if mode.contains(AddressingMode::DIRECT) {
                let value = cpu.read_register16(*reg).wrapping_sub(1);
                cpu.write_register16(*reg, value);
                return Ok(instruction.cycles.0);
            }
        }

        let value = Self::resolve8(cpu, mmu, lhs, instruction)?;
        let result = value.wrapping_sub(1);

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, true);
        cpu.update_flag(Flags::HALF_CARRY, (result & 0xf) > (value & 0xf));

        Self::write_back(cpu, mmu, lhs, result, instruction)?;

        Ok(instruction.cycles.0)
    }

    /// BCD adjust after an add or subtract.
    pub fn decimal_adjust(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let mut a = cpu.read_register(Reg8::A);
        let subtract = cpu.read_flag(Flags::SUBTRACT);
        let half_carry = cpu.read_flag(Flags::HALF_CARRY);
        let carry = cpu.read_flag(Flags::CARRY);

        if !subtract {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                cpu.update_flag(Flags::CARRY, true);
            }
            if half_carry || (a & 0x0f) > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if half_carry {
                a = a.wrapping_sub(0x06);
            }
        }

        cpu.update_flag(Flags::ZERO, a == 0);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.write_register(Reg8::A, a);

        Ok(instruction.cycles.0)
    }

    pub fn complement(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let value = cpu.read_register(Reg8::A);
        cpu.write_register(Reg8::A, !value);

        cpu.update_flag(Flags::SUBTRACT, true);
        cpu.update_flag(Flags::HALF_CARRY, true);

        Ok(instruction.cycles.0)
    }

    /// `scf` sets carry, `ccf` toggles it.
    pub fn carry_flag(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let carry = match instruction.opcode {
            Opcode::Scf => true,
            _ => !cpu.read_flag(Flags::CARRY),
        };

        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, carry);

        Ok(instruction.cycles.0)
    }

    pub fn rotate_left(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let (value, through_carry, implicit_a) = match instruction.opcode {
            Opcode::Rlca => (cpu.read_register(Reg8::A), false, true),
            Opcode::Rla => (cpu.read_register(Reg8::A), true, true),
            Opcode::Rlc => (Self::resolve_lhs8(cpu, mmu, instruction)?, false, false),
            _ => (Self::resolve_lhs8(cpu, mmu, instruction)?, true, false),
        };

        let carry_out = value >> 7;
        let carry_in = if through_carry {
            cpu.read_flag(Flags::CARRY) as u8
        } else {
            carry_out
        };
        let result = (value << 1) | carry_in;

        // the a-register forms always clear Z
        cpu.update_flag(Flags::ZERO, !implicit_a && result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, carry_out != 0);

        if implicit_a {
            cpu.write_register(Reg8::A, result);
        } else {
            let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
            Self::write_back(cpu, mmu, lhs, result, instruction)?;
        }

        Ok(instruction.cycles.0)
    }

    pub fn rotate_right(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let (value, through_carry, implicit_a) = match instruction.opcode {
            Opcode::Rrca => (cpu.read_register(Reg8::A), false, true),
            Opcode::Rra => (cpu.read_register(Reg8::A), true, true),
            Opcode::Rrc => (Self::resolve_lhs8(cpu, mmu, instruction)?, false, false),
            _ => (Self::resolve_lhs8(cpu, mmu, instruction)?, true, false),
        };

        let carry_out = value & 1;
        let carry_in = if through_carry {
            cpu.read_flag(Flags::CARRY) as u8
        } else {
            carry_out
        };
        let result = (value >> 1) | (carry_in << 7);

        cpu.update_flag(Flags::ZERO, !implicit_a && result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, carry_out != 0);

        if implicit_a {
            cpu.write_register(Reg8::A, result);
        } else {
            let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
            Self::write_back(cpu, mmu, lhs, result, instruction)?;
        }

        Ok(instruction.cycles.0)
    }

    pub fn shift(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let value = Self::resolve8(cpu, mmu, lhs, instruction)?;

        let (result, carry) = match instruction.opcode {
            Opcode::Sla => (value << 1, value >> 7),
            // sra keeps the sign bit
            Opcode::Sra => ((value >> 1) | (value & 0x80), value & 1),
            _ => (value >> 1, value & 1),
        };

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, carry != 0);

        Self::write_back(cpu, mmu, lhs, result, instruction)?;

        Ok(instruction.cycles.0)
    }

    pub fn swap(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let value = Self::resolve8(cpu, mmu, lhs, instruction)?;
        let result = (value >> 4) | (value << 4);

        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, false);

        Self::write_back(cpu, mmu, lhs, result, instruction)?;

        Ok(instruction.cycles.0)
    }

    pub fn test_bit(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let Some(Operand::Bit(bit)) = instruction.lhs else {
            return Err(Self::invalid(instruction));
        };
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let value = Self::resolve8(cpu, mmu, rhs, instruction)?;

        cpu.update_flag(Flags::ZERO, value & (1 << bit) == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, true);

        Ok(instruction.cycles.0)
    }

    pub fn reset_bit(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let Some(Operand::Bit(bit)) = instruction.lhs else {
            return Err(Self::invalid(instruction));
        };
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let value = Self::resolve8(cpu, mmu, rhs, instruction)?;

        Self::write_back(cpu, mmu, rhs, value & !(1 << bit), instruction)?;

        Ok(instruction.cycles.0)
    }

    pub fn set_bit(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let Some(Operand::Bit(bit)) = instruction.lhs else {
            return Err(Self::invalid(instruction));
        };
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        let value = Self::resolve8(cpu, mmu, rhs, instruction)?;

        Self::write_back(cpu, mmu, rhs, value | (1 << bit), instruction)?;

        Ok(instruction.cycles.0)
    }

    pub fn jump(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let Some(Operand::Conditional(condition)) = instruction.lhs else {
            return Err(Self::invalid(instruction));
        };
        let rhs = instruction.rhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;

        if !cpu.check_condition(&condition) {
            return Ok(instruction.cycles.1.unwrap_or(instruction.cycles.0));
        }

        let target = match (instruction.opcode, rhs) {
            // relative to the address after the operand
            (Opcode::Jr, Operand::Offset(offset)) => {
                cpu.read_register16(Reg16::PC).wrapping_add(*offset as i16 as u16)
            }
            _ => Self::resolve16(cpu, rhs, instruction)?,
        };

        if instruction.opcode == Opcode::Call {
            let pc = cpu.read_register16(Reg16::PC);
            cpu.push_stack(mmu, pc);
        }

        cpu.write_register16(Reg16::PC, target);

        Ok(instruction.cycles.0)
    }

    pub fn ret(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        if instruction.opcode == Opcode::Reti {
            let target = cpu.pop_stack(mmu);
            cpu.write_register16(Reg16::PC, target);
            cpu.enable_interrupts();
            return Ok(instruction.cycles.0);
        }

        let condition = match instruction.lhs {
            Some(Operand::Conditional(condition)) => condition,
            _ => Condition::None,
        };

        if !cpu.check_condition(&condition) {
            return Ok(instruction.cycles.1.unwrap_or(instruction.cycles.0));
        }

        let target = cpu.pop_stack(mmu);
        cpu.write_register16(Reg16::PC, target);

        Ok(instruction.cycles.0)
    }

    pub fn restart(cpu: &mut Cpu, mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        let Some(Operand::Imm8(vector, _)) = instruction.lhs else {
            return Err(Self::invalid(instruction));
        };

        let pc = cpu.read_register16(Reg16::PC);
        cpu.push_stack(mmu, pc);
        cpu.write_register16(Reg16::PC, vector as u16);

        Ok(instruction.cycles.0)
    }

    pub fn halt(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        cpu.halt();
        Ok(instruction.cycles.0)
    }

    pub fn handle_interrupt_toggle(cpu: &mut Cpu, _mmu: &mut Mmu, instruction: &Instruction) -> Result<usize, DotError> {
        match instruction.opcode {
            Opcode::Ei => cpu.enable_interrupts(),
            _ => cpu.disable_interrupts(),
        }

        Ok(instruction.cycles.0)
    }

    /// Value of an 8-bit operand. Reading through `(HL+)`/`(HL-)` applies
    /// the post-increment or post-decrement.
    fn resolve8(cpu: &mut Cpu, mmu: &Mmu, operand: &Operand, instruction: &Instruction) -> Result<u8, DotError> {
        match operand {
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::DIRECT) => Ok(cpu.read_register(*reg)),
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::INDIRECT) => {
                Ok(mmu.read(HIGH_PAGE + cpu.read_register(*reg) as u16))
            }
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::INDIRECT) => {
                let addr = cpu.read_register16(*reg);
                let value = mmu.read(addr);
                Self::apply_post_op(cpu, *reg, *mode);
                Ok(value)
            }
            Operand::Imm8(value, mode) if mode.contains(AddressingMode::DIRECT) => Ok(*value),
            Operand::Imm8(offset, mode) if mode.contains(AddressingMode::INDIRECT) => {
                Ok(mmu.read(HIGH_PAGE + *offset as u16))
            }
            Operand::Imm16(addr, mode) if mode.contains(AddressingMode::INDIRECT) => Ok(mmu.read(*addr)),
            _ => Err(Self::invalid(instruction)),
        }
    }

    fn resolve_lhs8(cpu: &mut Cpu, mmu: &Mmu, instruction: &Instruction) -> Result<u8, DotError> {
        let lhs = instruction.lhs.as_ref().ok_or_else(|| Self::invalid(instruction))?;
        Self::resolve8(cpu, mmu, lhs, instruction)
    }

    fn resolve16(cpu: &Cpu, operand: &Operand, instruction: &Instruction) -> Result<u16, DotError> {
        match operand {
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::DIRECT) => Ok(cpu.read_register16(*reg)),
            Operand::Imm16(value, mode) if mode.contains(AddressingMode::DIRECT) => Ok(*value),
            _ => Err(Self::invalid(instruction)),
        }
    }

    /// Writes an 8-bit result back to a register or `(HL)` target.
    fn write_back(cpu: &mut Cpu, mmu: &mut Mmu, operand: &Operand, value: u8, instruction: &Instruction) -> Result<(), DotError> {
        match operand {
            Operand::Reg8(reg, mode) if mode.contains(AddressingMode::DIRECT) => {
                cpu.write_register(*reg, value);
                Ok(())
            }
            Operand::Reg16(reg, mode) if mode.contains(AddressingMode::INDIRECT) => {
                mmu.write(cpu.read_register16(*reg), value);
                Ok(())
            }
            _ => Err(Self::invalid(instruction)),
        }
    }

    fn apply_post_op(cpu: &mut Cpu, reg: Reg16, mode: AddressingMode) {
        let addr = cpu.read_register16(reg);
        if mode.contains(AddressingMode::INCREMENT) {
            cpu.write_register16(reg, addr.wrapping_add(1));
        } else if mode.contains(AddressingMode::DECREMENT) {
            cpu.write_register16(reg, addr.wrapping_sub(1));
        }
    }

    /// `sp+e` arithmetic shared by `add sp, e` and `ld hl, sp+e`: carries
    /// come from the low byte, Z and N are cleared.
    fn stack_pointer_offset(cpu: &mut Cpu, offset: i8) -> u16 {
        let sp = cpu.read_register16(Reg16::SP);
        let unsigned = offset as u8 as u16;

        cpu.update_flag(Flags::ZERO, false);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, (sp & 0xf) + (unsigned & 0xf) > 0xf);
        cpu.update_flag(Flags::CARRY, (sp & 0xff) + (unsigned & 0xff) > 0xff);

        sp.wrapping_add(offset as i16 as u16)
    }

    fn set_sub_flags(cpu: &mut Cpu, before: u8, result: u8) {
        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, true);
        cpu.update_flag(Flags::HALF_CARRY, (result & 0xf) > (before & 0xf));
        cpu.update_flag(Flags::CARRY, result > before);
    }

    fn set_logic_flags(cpu: &mut Cpu, result: u8) {
        cpu.update_flag(Flags::ZERO, result == 0);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, false);
    }

    fn invalid(instruction: &Instruction) -> DotError {
        DotError::InvalidHandler {
            instruction: instruction.clone(),
        }
    }
}
