use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Flags: u8 {
        const ZERO       = 0b1000_0000;
        const SUBTRACT   = 0b0100_0000;
        const HALF_CARRY = 0b0010_0000;
        const CARRY      = 0b0001_0000;
    }
}

/// 8-bit sub-registers. The discriminant doubles as the hardware register
/// field in opcode encodings (`110` is the `(HL)` memory operand and has
/// no entry here).
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Reg8 {
    B = 0,
    C = 1,
    D = 2,
    E = 3,
    H = 4,
    L = 5,
    A = 7,
}

/// 16-bit register pairs, indexed by their slot in the register file.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Reg16 {
    BC = 0,
    DE = 1,
    HL = 2,
    SP = 3,
    PC = 4,
    AF = 7,
}

/// The register file as eight 16-bit slots. `A` lives in the high byte of
/// slot 7 and the flag byte in its low byte; every other sub-register maps
/// to the high byte of slot `id / 2` when its id is even, low byte when
/// odd. The low nibble of the flag byte is always zero.
#[derive(Clone)]
pub struct RegisterFile {
    slots: [u16; 8],
}

impl RegisterFile {
    pub fn read16(&self, reg: Reg16) -> u16 {
        self.slots[reg as usize]
    }

    pub fn write16(&mut self, reg: Reg16, value: u16) {
        let value = if reg == Reg16::AF { value & 0xfff0 } else { value };
        self.slots[reg as usize] = value;
    }

    pub fn read8(&self, reg: Reg8) -> u8 {
        let value = self.slots[Self::slot_of(reg)];
        if Self::is_high_byte(reg) {
            (value >> 8) as u8
        } else {
            (value & 0xff) as u8
        }
    }

    pub fn write8(&mut self, reg: Reg8, value: u8) {
        let slot = &mut self.slots[Self::slot_of(reg)];
        if Self::is_high_byte(reg) {
            *slot = (*slot & 0x00ff) | ((value as u16) << 8);
        } else {
            *slot = (*slot & 0xff00) | value as u16;
        }
    }

    pub fn flags(&self) -> Flags {
        Flags::from_bits_truncate((self.slots[Reg16::AF as usize] & 0xff) as u8)
    }

    pub fn set_flag(&mut self, flag: Flags, value: bool) {
        let af = self.slots[Reg16::AF as usize];
        let mask = flag.bits() as u16;
        self.slots[Reg16::AF as usize] = if value { af | mask } else { af & !mask };
    }

    fn slot_of(reg: Reg8) -> usize {
        if reg == Reg8::A {
            7
        } else {
            reg as usize / 2
        }
    }

    fn is_high_byte(reg: Reg8) -> bool {
        reg as usize % 2 == 0 || reg == Reg8::A
    }
}

impl Default for RegisterFile {
    fn default() -> RegisterFile {
        RegisterFile { slots: [0; 8] }
    }
}

impl std::fmt::Display for Reg8 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Reg8::A => "a",
            Reg8::B => "b",
            Reg8::C => "c",
            Reg8::D => "d",
            Reg8::E => "e",
            Reg8::H => "h",
            Reg8::L => "l",
        };
        write!(f, "{}", name)
    }
}

impl std::fmt::Display for Reg16 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Reg16::BC => "bc",
            Reg16::DE => "de",
            Reg16::HL => "hl",
            Reg16::SP => "sp",
            Reg16::PC => "pc",
            Reg16::AF => "af",
        };
        write!(f, "{}", name)
    }
}
