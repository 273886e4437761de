use crate::error::{DotError, OpcodePage};
use crate::lr35902::cpu::Cpu;
use crate::lr35902::registers::{Reg16, Reg8};
use crate::memory::mmu::Mmu;
use bitflags::bitflags;

bitflags! {
    #[derive(PartialEq, Debug, Clone, Copy)]
    pub struct AddressingMode: u8 {
        const DIRECT    = 0b0001;
        const INDIRECT  = 0b0010;
        const INCREMENT = 0b0100;
        const DECREMENT = 0b1000;
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Condition {
    None,
    NZ,
    Z,
    NC,
    C,
}

#[derive(Debug, Clone, Copy)]
pub enum Operand {
    Reg8(Reg8, AddressingMode),
    Reg16(Reg16, AddressingMode),
    Imm8(u8, AddressingMode),
    Imm16(u16, AddressingMode),
    Conditional(Condition),
    DisplacedReg16(Reg16, i8),
    Offset(i8),
    Bit(u8),
}

#[derive(PartialEq, Debug, Copy, Clone)]
pub enum Opcode {
    Nop,
    Ld,
    Ldh,
    Inc,
    Dec,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Daa,
    Cpl,
    Ccf,
    Scf,
    Rlca,
    Rla,
    Rrca,
    Rra,
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit,
    Res,
    Set,
    Jp,
    Jr,
    Call,
    Ret,
    Reti,
    Rst,
    Push,
    Pop,
    Halt,
    Stop,
    Di,
    Ei,
}

/// One decoded instruction. Operand bytes have already been consumed from
/// the instruction stream, so `PC` points past the whole encoding by the
/// time a handler runs.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: Opcode,
    pub lhs: Option<Operand>,
    pub rhs: Option<Operand>,
    /// (cycles when taken, cycles when a condition falls through)
    pub cycles: (usize, Option<usize>),
}

impl Instruction {
    fn new(opcode: Opcode, lhs: Option<Operand>, rhs: Option<Operand>, cycles: (usize, Option<usize>)) -> Instruction {
        Instruction { opcode, lhs, rhs, cycles }
    }
}

fn lookup_register(data: u8) -> Result<Reg8, DotError> {
    match data {
        0b000 => Ok(Reg8::B),
        0b001 => Ok(Reg8::C),
        0b010 => Ok(Reg8::D),
        0b011 => Ok(Reg8::E),
        0b100 => Ok(Reg8::H),
        0b101 => Ok(Reg8::L),
        0b111 => Ok(Reg8::A),
        _ => Err(DotError::UnknownRegisterBits { data }),
    }
}

fn lookup_pair(data: u8) -> Result<Reg16, DotError> {
    match data {
        0b00 => Ok(Reg16::BC),
        0b01 => Ok(Reg16::DE),
        0b10 => Ok(Reg16::HL),
        0b11 => Ok(Reg16::SP),
        _ => Err(DotError::UnknownRegisterBits { data }),
    }
}

// The `11` pair pattern means AF for push/pop, not SP.
fn lookup_stack_pair(data: u8) -> Result<Reg16, DotError> {
    match lookup_pair(data)? {
        Reg16::SP => Ok(Reg16::AF),
        pair => Ok(pair),
    }
}

fn lookup_condition(data: u8) -> Result<Condition, DotError> {
    match data {
        0b00 => Ok(Condition::NZ),
        0b01 => Ok(Condition::Z),
        0b10 => Ok(Condition::NC),
        0b11 => Ok(Condition::C),
        _ => Err(DotError::UnknownConditionBits { data }),
    }
}

/// Register field `110` denotes the `(HL)` memory operand, which costs the
/// longer cycle count.
fn operand8(data: u8, base_cycles: usize, hl_cycles: usize) -> Result<(Operand, usize), DotError> {
    if data == 0b110 {
        Ok((Operand::Reg16(Reg16::HL, AddressingMode::INDIRECT), hl_cycles))
    } else {
        Ok((Operand::Reg8(lookup_register(data)?, AddressingMode::DIRECT), base_cycles))
    }
}

/// Decodes the instruction at `PC`, consuming the opcode and operand bytes
/// through the CPU's fetch helpers.
pub fn decode(cpu: &mut Cpu, mmu: &Mmu) -> Result<Instruction, DotError> {
    let pc = cpu.read_register16(Reg16::PC);
    let opcode = cpu.fetch_byte(mmu);

    if opcode == 0xcb {
        return decode_prefixed(cpu, mmu);
    }

    let a_direct = Operand::Reg8(Reg8::A, AddressingMode::DIRECT);
    let no_cond = Operand::Conditional(Condition::None);

    let instruction = match opcode {
        0x00 => Instruction::new(Opcode::Nop, None, None, (4, None)),
        // stop carries a padding byte
        0x10 => {
            let _ = cpu.fetch_byte(mmu);
            Instruction::new(Opcode::Stop, None, None, (4, None))
        }
        0x76 => Instruction::new(Opcode::Halt, None, None, (4, None)),
        0xf3 => Instruction::new(Opcode::Di, None, None, (4, None)),
        0xfb => Instruction::new(Opcode::Ei, None, None, (4, None)),
        0x27 => Instruction::new(Opcode::Daa, None, None, (4, None)),
        0x2f => Instruction::new(Opcode::Cpl, None, None, (4, None)),
        0x37 => Instruction::new(Opcode::Scf, None, None, (4, None)),
        0x3f => Instruction::new(Opcode::Ccf, None, None, (4, None)),
        0x07 => Instruction::new(Opcode::Rlca, None, None, (4, None)),
        0x17 => Instruction::new(Opcode::Rla, None, None, (4, None)),
        0x0f => Instruction::new(Opcode::Rrca, None, None, (4, None)),
        0x1f => Instruction::new(Opcode::Rra, None, None, (4, None)),

        // ld (imm16), sp
        0x08 => {
            let addr = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Ld,
                Some(Operand::Imm16(addr, AddressingMode::INDIRECT)),
                Some(Operand::Reg16(Reg16::SP, AddressingMode::DIRECT)),
                (20, None),
            )
        }
        // ld (bc)/(de), a and ld a, (bc)/(de)
        0x02 => Instruction::new(
            Opcode::Ld,
            Some(Operand::Reg16(Reg16::BC, AddressingMode::INDIRECT)),
            Some(a_direct),
            (8, None),
        ),
        0x12 => Instruction::new(
            Opcode::Ld,
            Some(Operand::Reg16(Reg16::DE, AddressingMode::INDIRECT)),
            Some(a_direct),
            (8, None),
        ),
        0x0a => Instruction::new(
            Opcode::Ld,
            Some(a_direct),
            Some(Operand::Reg16(Reg16::BC, AddressingMode::INDIRECT)),
            (8, None),
        ),
        0x1a => Instruction::new(
            Opcode::Ld,
            Some(a_direct),
            Some(Operand::Reg16(Reg16::DE, AddressingMode::INDIRECT)),
            (8, None),
        ),
        // ldi/ldd through (hl)
        0x22 => Instruction::new(
            Opcode::Ld,
            Some(Operand::Reg16(Reg16::HL, AddressingMode::INDIRECT | AddressingMode::INCREMENT)),
            Some(a_direct),
            (8, None),
        ),
        0x32 => Instruction::new(
            Opcode::Ld,
            Some(Operand::Reg16(Reg16::HL, AddressingMode::INDIRECT | AddressingMode::DECREMENT)),
            Some(a_direct),
            (8, None),
        ),
        0x2a => Instruction::new(
            Opcode::Ld,
            Some(a_direct),
            Some(Operand::Reg16(Reg16::HL, AddressingMode::INDIRECT | AddressingMode::INCREMENT)),
            (8, None),
        ),
        0x3a => Instruction::new(
            Opcode::Ld,
            Some(a_direct),
            Some(Operand::Reg16(Reg16::HL, AddressingMode::INDIRECT | AddressingMode::DECREMENT)),
            (8, None),
        ),
        // the $ff00 page
        0xe0 => {
            let offset = cpu.fetch_byte(mmu);
            Instruction::new(
                Opcode::Ldh,
                Some(Operand::Imm8(offset, AddressingMode::INDIRECT)),
                Some(a_direct),
                (12, None),
            )
        }
        0xf0 => {
            let offset = cpu.fetch_byte(mmu);
            Instruction::new(
                Opcode::Ldh,
                Some(a_direct),
                Some(Operand::Imm8(offset, AddressingMode::INDIRECT)),
                (12, None),
            )
        }
        0xe2 => Instruction::new(
            Opcode::Ld,
            Some(Operand::Reg8(Reg8::C, AddressingMode::INDIRECT)),
            Some(a_direct),
            (8, None),
        ),
        0xf2 => Instruction::new(
            Opcode::Ld,
            Some(a_direct),
            Some(Operand::Reg8(Reg8::C, AddressingMode::INDIRECT)),
            (8, None),
        ),
        // ld (imm16), a / ld a, (imm16)
        0xea => {
            let addr = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Ld,
                Some(Operand::Imm16(addr, AddressingMode::INDIRECT)),
                Some(a_direct),
                (16, None),
            )
        }
        0xfa => {
            let addr = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Ld,
                Some(a_direct),
                Some(Operand::Imm16(addr, AddressingMode::INDIRECT)),
                (16, None),
            )
        }
        // sp arithmetic and transfers
        0xe8 => {
            let offset = cpu.fetch_byte(mmu) as i8;
            Instruction::new(
                Opcode::Add,
                Some(Operand::Reg16(Reg16::SP, AddressingMode::DIRECT)),
                Some(Operand::Offset(offset)),
                (16, None),
            )
        }
        0xf8 => {
            let offset = cpu.fetch_byte(mmu) as i8;
            Instruction::new(
                Opcode::Ld,
                Some(Operand::Reg16(Reg16::HL, AddressingMode::DIRECT)),
                Some(Operand::DisplacedReg16(Reg16::SP, offset)),
                (12, None),
            )
        }
        0xf9 => Instruction::new(
            Opcode::Ld,
            Some(Operand::Reg16(Reg16::SP, AddressingMode::DIRECT)),
            Some(Operand::Reg16(Reg16::HL, AddressingMode::DIRECT)),
            (8, None),
        ),
        // alu a, imm8
        0xc6 | 0xce | 0xd6 | 0xde | 0xe6 | 0xee | 0xf6 | 0xfe => {
            let operation = match (opcode >> 3) & 0b111 {
                0 => Opcode::Add,
                1 => Opcode::Adc,
                2 => Opcode::Sub,
                3 => Opcode::Sbc,
                4 => Opcode::And,
                5 => Opcode::Xor,
                6 => Opcode::Or,
                _ => Opcode::Cp,
            };
            let imm = cpu.fetch_byte(mmu);
            Instruction::new(
                operation,
                Some(a_direct),
                Some(Operand::Imm8(imm, AddressingMode::DIRECT)),
                (8, None),
            )
        }
        // unconditional control flow
        0xc3 => {
            let addr = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Jp,
                Some(no_cond),
                Some(Operand::Imm16(addr, AddressingMode::DIRECT)),
                (16, None),
            )
        }
        0xe9 => Instruction::new(
            Opcode::Jp,
            Some(no_cond),
            Some(Operand::Reg16(Reg16::HL, AddressingMode::DIRECT)),
            (4, None),
        ),
        0x18 => {
            let offset = cpu.fetch_byte(mmu) as i8;
            Instruction::new(Opcode::Jr, Some(no_cond), Some(Operand::Offset(offset)), (12, None))
        }
        0xcd => {
            let addr = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Call,
                Some(no_cond),
                Some(Operand::Imm16(addr, AddressingMode::DIRECT)),
                (24, None),
            )
        }
        0xc9 => Instruction::new(Opcode::Ret, Some(no_cond), None, (16, None)),
        0xd9 => Instruction::new(Opcode::Reti, None, None, (16, None)),

        // ld r8, r8 / ld r8, (hl) / ld (hl), r8
        o if o & 0xc0 == 0x40 => {
            let (lhs, lhs_cycles) = operand8((o >> 3) & 0b111, 4, 8)?;
            let (rhs, rhs_cycles) = operand8(o & 0b111, 4, 8)?;
            Instruction::new(Opcode::Ld, Some(lhs), Some(rhs), (lhs_cycles.max(rhs_cycles), None))
        }
        // ld r8, imm8 / ld (hl), imm8
        o if o & 0xc7 == 0x06 => {
            let (lhs, cycles) = operand8((o >> 3) & 0b111, 8, 12)?;
            let imm = cpu.fetch_byte(mmu);
            Instruction::new(
                Opcode::Ld,
                Some(lhs),
                Some(Operand::Imm8(imm, AddressingMode::DIRECT)),
                (cycles, None),
            )
        }
        // ld r16, imm16
        o if o & 0xcf == 0x01 => {
            let pair = lookup_pair((o >> 4) & 0b11)?;
            let imm = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Ld,
                Some(Operand::Reg16(pair, AddressingMode::DIRECT)),
                Some(Operand::Imm16(imm, AddressingMode::DIRECT)),
                (12, None),
            )
        }
        // inc/dec r16
        o if o & 0xcf == 0x03 => {
            let pair = lookup_pair((o >> 4) & 0b11)?;
            Instruction::new(
                Opcode::Inc,
                Some(Operand::Reg16(pair, AddressingMode::DIRECT)),
                None,
                (8, None),
            )
        }
        o if o & 0xcf == 0x0b => {
            let pair = lookup_pair((o >> 4) & 0b11)?;
            Instruction::new(
                Opcode::Dec,
                Some(Operand::Reg16(pair, AddressingMode::DIRECT)),
                None,
                (8, None),
            )
        }
        // add hl, r16
        o if o & 0xcf == 0x09 => {
            let pair = lookup_pair((o >> 4) & 0b11)?;
            Instruction::new(
                Opcode::Add,
                Some(Operand::Reg16(Reg16::HL, AddressingMode::DIRECT)),
                Some(Operand::Reg16(pair, AddressingMode::DIRECT)),
                (8, None),
            )
        }
        // inc/dec r8 / (hl)
        o if o & 0xc7 == 0x04 => {
            let (lhs, cycles) = operand8((o >> 3) & 0b111, 4, 12)?;
            Instruction::new(Opcode::Inc, Some(lhs), None, (cycles, None))
        }
        o if o & 0xc7 == 0x05 => {
            let (lhs, cycles) = operand8((o >> 3) & 0b111, 4, 12)?;
            Instruction::new(Opcode::Dec, Some(lhs), None, (cycles, None))
        }
        // alu a, r8 / (hl)
        o if o & 0xc0 == 0x80 => {
            let operation = match (o >> 3) & 0b111 {
                0 => Opcode::Add,
                1 => Opcode::Adc,
                2 => Opcode::Sub,
                3 => Opcode::Sbc,
                4 => Opcode::And,
                5 => Opcode::Xor,
                6 => Opcode::Or,
                _ => Opcode::Cp,
            };
            let (rhs, cycles) = operand8(o & 0b111, 4, 8)?;
            Instruction::new(operation, Some(a_direct), Some(rhs), (cycles, None))
        }
        // conditional control flow
        o if o & 0xe7 == 0x20 => {
            let condition = lookup_condition((o >> 3) & 0b11)?;
            let offset = cpu.fetch_byte(mmu) as i8;
            Instruction::new(
                Opcode::Jr,
                Some(Operand::Conditional(condition)),
                Some(Operand::Offset(offset)),
                (12, Some(8)),
            )
        }
        o if o & 0xe7 == 0xc2 => {
            let condition = lookup_condition((o >> 3) & 0b11)?;
            let addr = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Jp,
                Some(Operand::Conditional(condition)),
                Some(Operand::Imm16(addr, AddressingMode::DIRECT)),
                (16, Some(12)),
            )
        }
        o if o & 0xe7 == 0xc0 => {
            let condition = lookup_condition((o >> 3) & 0b11)?;
            Instruction::new(Opcode::Ret, Some(Operand::Conditional(condition)), None, (20, Some(8)))
        }
        o if o & 0xe7 == 0xc4 => {
            let condition = lookup_condition((o >> 3) & 0b11)?;
            let addr = cpu.fetch_word(mmu);
            Instruction::new(
                Opcode::Call,
                Some(Operand::Conditional(condition)),
                Some(Operand::Imm16(addr, AddressingMode::DIRECT)),
                (24, Some(12)),
            )
        }
        // push/pop r16 (the `11` pattern selects af here)
        o if o & 0xcf == 0xc5 => {
            let pair = lookup_stack_pair((o >> 4) & 0b11)?;
            Instruction::new(
                Opcode::Push,
                Some(Operand::Reg16(pair, AddressingMode::DIRECT)),
                None,
                (16, None),
            )
        }
        o if o & 0xcf == 0xc1 => {
            let pair = lookup_stack_pair((o >> 4) & 0b11)?;
            Instruction::new(
                Opcode::Pop,
                Some(Operand::Reg16(pair, AddressingMode::DIRECT)),
                None,
                (12, None),
            )
        }
        // rst n
        o if o & 0xc7 == 0xc7 => Instruction::new(
            Opcode::Rst,
            Some(Operand::Imm8(o & 0x38, AddressingMode::DIRECT)),
            None,
            (16, None),
        ),
        _ => {
            return Err(DotError::UnknownOpcode {
                page: OpcodePage::Unprefixed,
                opcode,
                pc,
            })
        }
    };

    Ok(instruction)
}

/// The `0xCB` escape page: rotates, shifts, swap, and single-bit ops.
/// Every one of the 256 encodings is valid.
fn decode_prefixed(cpu: &mut Cpu, mmu: &Mmu) -> Result<Instruction, DotError> {
    let opcode = cpu.fetch_byte(mmu);

    let instruction = match opcode & 0xc0 {
        0x40 => {
            let (rhs, cycles) = operand8(opcode & 0b111, 8, 12)?;
            Instruction::new(
                Opcode::Bit,
                Some(Operand::Bit((opcode >> 3) & 0b111)),
                Some(rhs),
                (cycles, None),
            )
        }
        0x80 => {
            let (rhs, cycles) = operand8(opcode & 0b111, 8, 16)?;
            Instruction::new(
                Opcode::Res,
                Some(Operand::Bit((opcode >> 3) & 0b111)),
                Some(rhs),
                (cycles, None),
            )
        }
        0xc0 => {
            let (rhs, cycles) = operand8(opcode & 0b111, 8, 16)?;
            Instruction::new(
                Opcode::Set,
                Some(Operand::Bit((opcode >> 3) & 0b111)),
                Some(rhs),
                (cycles, None),
            )
        }
        _ => {
            let operation = match (opcode >> 3) & 0b111 {
                0 => Opcode::Rlc,
                1 => Opcode::Rrc,
                2 => Opcode::Rl,
                3 => Opcode::Rr,
                4 => Opcode::Sla,
                5 => Opcode::Sra,
                6 => Opcode::Swap,
                _ => Opcode::Srl,
            };
            let (lhs, cycles) = operand8(opcode & 0b111, 8, 16)?;
            Instruction::new(operation, Some(lhs), None, (cycles, None))
        }
    };

    Ok(instruction)
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut output = format!("{:?}", self.opcode).to_lowercase();

        let mut bare_condition = false;
        if let Some(destination) = &self.lhs {
            match destination {
                Operand::Conditional(cond) if *cond == Condition::None => bare_condition = true,
                _ => output.push_str(&format!(" {}", destination)),
            };
        }

        if let Some(source) = &self.rhs {
            if bare_condition {
                output.push_str(&format!(" {}", source));
            } else {
                output.push_str(&format!(", {}", source));
            }
        }

        write!(f, "{}", output)
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let output = match self {
            Operand::Reg8(reg, mode) => {
                if mode.contains(AddressingMode::INDIRECT) {
                    format!("({})", reg)
                } else {
                    format!("{}", reg)
                }
            }
            Operand::Reg16(reg, mode) => {
                if mode.contains(AddressingMode::INDIRECT) {
                    if mode.contains(AddressingMode::INCREMENT) {
                        format!("({}+)", reg)
                    } else if mode.contains(AddressingMode::DECREMENT) {
                        format!("({}-)", reg)
                    } else {
                        format!("({})", reg)
                    }
                } else {
                    format!("{}", reg)
                }
            }
            Operand::Imm8(value, mode) => {
                if mode.contains(AddressingMode::INDIRECT) {
                    format!("($ff00+{:#04x})", value)
                } else {
                    format!("{:#04x}", value)
                }
            }
            Operand::Imm16(value, mode) => {
                if mode.contains(AddressingMode::INDIRECT) {
                    format!("({:#06x})", value)
                } else {
                    format!("{:#06x}", value)
                }
            }
            Operand::Conditional(cond) => format!("{}", cond),
            Operand::Offset(value) => {
                if *value >= 0 {
                    format!("+{}", value)
                } else {
                    format!("{}", value)
                }
            }
            Operand::Bit(value) => format!("{}", value),
            Operand::DisplacedReg16(reg, value) => format!("{}{:+#04x}", reg, value),
        };

        write!(f, "{}", output)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let output = match self {
            Condition::None => "",
            Condition::NZ => "nz",
            Condition::Z => "z",
            Condition::NC => "nc",
            Condition::C => "c",
        };

        write!(f, "{}", output)
    }
}
